//! Command-line definitions for the `glim` binary.
//!
//! Flags override the file and `GLIM__` environment layers loaded by
//! [`AppConfig::load`]; each flag is also readable from its own `GLIM_*`
//! variable.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use glim_core::config::AppConfig;
use glim_core::config::database::PostgresConfig;
use glim_core::config::logging::LogFormat;
use glim_core::config::session::RedisConfig;

/// Glim: a small identity service with a REST API and an LDAP front-end.
#[derive(Debug, Parser)]
#[command(name = "glim", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Server management
    Server {
        #[command(subcommand)]
        command: ServerCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum ServerCommand {
    /// Start the REST API and LDAP servers
    Start(Box<StartArgs>),
}

#[derive(Debug, Clone, Default, Args)]
pub struct StartArgs {
    /// TOML configuration file
    #[arg(long, env = "GLIM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Secret used to sign API tokens
    #[arg(long, env = "GLIM_API_SECRET", hide_env_values = true)]
    pub api_secret: Option<String>,
    /// REST API bind address
    #[arg(long, env = "GLIM_API_ADDR")]
    pub api_addr: Option<String>,
    /// REST API port
    #[arg(long, env = "GLIM_API_PORT")]
    pub api_port: Option<u16>,

    /// LDAP bind address
    #[arg(long, env = "GLIM_LDAP_ADDR")]
    pub ldap_addr: Option<String>,
    /// LDAP port
    #[arg(long, env = "GLIM_LDAP_PORT")]
    pub ldap_port: Option<u16>,
    /// Directory suffix, `dc=example,dc=org` or `example.org`
    #[arg(long, env = "GLIM_LDAP_DOMAIN")]
    pub ldap_domain: Option<String>,
    /// Serve plain LDAP instead of LDAPS
    #[arg(long, env = "GLIM_LDAP_NO_TLS")]
    pub ldap_no_tls: bool,
    /// Maximum entries per LDAP search
    #[arg(long, env = "GLIM_LDAP_SIZE_LIMIT")]
    pub ldap_size_limit: Option<u32>,

    /// PEM certificate chain for HTTPS and LDAPS
    #[arg(long, env = "GLIM_TLSCERT")]
    pub tlscert: Option<PathBuf>,
    /// PEM private key for HTTPS and LDAPS
    #[arg(long, env = "GLIM_TLSKEY")]
    pub tlskey: Option<PathBuf>,

    /// Sqlite catalog file
    #[arg(long, env = "GLIM_SQLITE_DB")]
    pub sqlite_db: Option<String>,
    /// PostgreSQL host; selects the postgres catalog
    #[arg(long, env = "GLIM_POSTGRES_HOST")]
    pub postgres_host: Option<String>,
    #[arg(long, env = "GLIM_POSTGRES_PORT")]
    pub postgres_port: Option<u16>,
    #[arg(long, env = "GLIM_POSTGRES_USER")]
    pub postgres_user: Option<String>,
    #[arg(long, env = "GLIM_POSTGRES_PASSWORD", hide_env_values = true)]
    pub postgres_password: Option<String>,
    #[arg(long, env = "GLIM_POSTGRES_DB")]
    pub postgres_db: Option<String>,
    /// CA certificate; enables `sslmode=verify-full`
    #[arg(long, env = "GLIM_POSTGRES_ROOT_CA")]
    pub postgres_root_ca: Option<String>,
    #[arg(long, env = "GLIM_POSTGRES_CLIENT_CERT")]
    pub postgres_client_cert: Option<String>,
    #[arg(long, env = "GLIM_POSTGRES_CLIENT_KEY")]
    pub postgres_client_key: Option<String>,

    /// Directory of the persistent embedded session store
    #[arg(long, env = "GLIM_BADGERDB_STORE")]
    pub badgerdb_store: Option<String>,
    /// Redis host; selects the redis session store
    #[arg(long, env = "GLIM_REDIS_HOST")]
    pub redis_host: Option<String>,
    #[arg(long, env = "GLIM_REDIS_PORT")]
    pub redis_port: Option<u16>,
    #[arg(long, env = "GLIM_REDIS_PASSWORD", hide_env_values = true)]
    pub redis_password: Option<String>,
    #[arg(long, env = "GLIM_REDIS_DB_INDEX")]
    pub redis_db_index: Option<u32>,

    /// Access token lifetime in seconds
    #[arg(long, env = "GLIM_ACCESS_TOKEN_EXPIRY")]
    pub access_token_expiry: Option<u64>,
    /// Refresh token lifetime in seconds
    #[arg(long, env = "GLIM_REFRESH_TOKEN_EXPIRY")]
    pub refresh_token_expiry: Option<u64>,
    /// Days a refresh chain may live without a new login
    #[arg(long, env = "GLIM_MAX_DAYS_RELOGIN")]
    pub max_days_relogin: Option<u64>,

    /// Password for the `admin` account when it is first created
    #[arg(long, env = "GLIM_INITIAL_ADMIN_PASSWD", hide_env_values = true)]
    pub initial_admin_passwd: Option<String>,
    /// Password for the `search` account when it is first created
    #[arg(long, env = "GLIM_INITIAL_SEARCH_PASSWD", hide_env_values = true)]
    pub initial_search_passwd: Option<String>,
    /// Comma-separated plain users to create
    #[arg(long, env = "GLIM_INITIAL_USERS")]
    pub initial_users: Option<String>,
    /// Password for the initial users
    #[arg(long, env = "GLIM_INITIAL_USERS_PASSWORD", hide_env_values = true)]
    pub initial_users_password: Option<String>,

    /// Expose Apache Guacamole group attributes
    #[arg(long, env = "GLIM_GUACAMOLE")]
    pub guacamole: bool,

    /// Log level filter (overridden by RUST_LOG)
    #[arg(long, env = "GLIM_LOG_LEVEL")]
    pub log_level: Option<String>,
    /// Log output: pretty or json
    #[arg(long, env = "GLIM_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,
}

impl StartArgs {
    /// Overlay the flags that were given onto `config`.
    pub fn apply(&self, config: &mut AppConfig) {
        set(&mut config.api.secret, &self.api_secret);
        set(&mut config.api.addr, &self.api_addr);
        set(&mut config.api.port, &self.api_port);
        set(&mut config.api.access_token_expiry, &self.access_token_expiry);
        set(&mut config.api.refresh_token_expiry, &self.refresh_token_expiry);
        set(&mut config.api.max_days_relogin, &self.max_days_relogin);

        set(&mut config.ldap.addr, &self.ldap_addr);
        set(&mut config.ldap.port, &self.ldap_port);
        set(&mut config.ldap.domain, &self.ldap_domain);
        set(&mut config.ldap.size_limit, &self.ldap_size_limit);
        if self.ldap_no_tls {
            config.ldap.no_tls = true;
        }

        set_some(&mut config.tls.cert, &self.tlscert);
        set_some(&mut config.tls.key, &self.tlskey);

        set_some(&mut config.database.sqlite_db, &self.sqlite_db);
        if let Some(host) = &self.postgres_host {
            config
                .database
                .postgres
                .get_or_insert_with(|| PostgresConfig::new(host.as_str()))
                .host = host.clone();
        }
        if let Some(pg) = config.database.postgres.as_mut() {
            set(&mut pg.port, &self.postgres_port);
            set(&mut pg.user, &self.postgres_user);
            set(&mut pg.password, &self.postgres_password);
            set(&mut pg.db, &self.postgres_db);
            set_some(&mut pg.root_ca, &self.postgres_root_ca);
            set_some(&mut pg.client_cert, &self.postgres_client_cert);
            set_some(&mut pg.client_key, &self.postgres_client_key);
        }

        set_some(&mut config.session.badgerdb_store, &self.badgerdb_store);
        if let Some(host) = &self.redis_host {
            config
                .session
                .redis
                .get_or_insert_with(|| RedisConfig::new(host.as_str()))
                .host = host.clone();
        }
        if let Some(redis) = config.session.redis.as_mut() {
            set(&mut redis.port, &self.redis_port);
            set_some(&mut redis.password, &self.redis_password);
            set(&mut redis.db_index, &self.redis_db_index);
        }

        set_some(&mut config.bootstrap.initial_admin_passwd, &self.initial_admin_passwd);
        set_some(&mut config.bootstrap.initial_search_passwd, &self.initial_search_passwd);
        set_some(&mut config.bootstrap.initial_users, &self.initial_users);
        set_some(
            &mut config.bootstrap.initial_users_password,
            &self.initial_users_password,
        );

        if self.guacamole {
            config.guacamole = true;
        }
        set(&mut config.logging.level, &self.log_level);
        set(&mut config.logging.format, &self.log_format);
    }
}

fn set<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

fn set_some<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
    if value.is_some() {
        target.clone_from(value);
    }
}
