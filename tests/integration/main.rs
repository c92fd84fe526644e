//! End-to-end tests for the REST API and the LDAP listener.

mod helpers;

mod auth_test;
mod group_test;
mod ldap_test;
mod user_test;
