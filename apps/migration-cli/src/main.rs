use clap::{Parser, ValueEnum};
use migration::{migrate, Database, MigrationCommand};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Env {
    Prod,
    Test,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Db {
    Postgres,
    SqliteFile,
}

#[derive(Parser)]
#[command(name = "migration-cli")]
#[command(about = "Collector database migration tool")]
struct Args {
    /// Migration command: up | down | fresh | reset | refresh | status
    command: String,

    /// Runtime environment (selects DATABASE_URL or TEST_DATABASE_URL)
    #[arg(short, long, value_enum, default_value = "test")]
    env: Env,

    /// Database type the URL must point at
    #[arg(short, long, value_enum, default_value = "postgres")]
    db: Db,
}

fn resolve_url(env: Env, db: Db) -> Result<String, String> {
    let var = match env {
        Env::Prod => "DATABASE_URL",
        Env::Test => "TEST_DATABASE_URL",
    };
    let url = std::env::var(var).map_err(|_| format!("{var} must be set"))?;

    let scheme_ok = match db {
        Db::Postgres => url.starts_with("postgres://") || url.starts_with("postgresql://"),
        Db::SqliteFile => url.starts_with("sqlite:") && !url.contains(":memory:"),
    };
    if !scheme_ok {
        return Err(format!("{var} does not point at a {db:?} database"));
    }

    if matches!(env, Env::Test) && matches!(db, Db::Postgres) {
        let db_name = url.rsplit('/').next().unwrap_or_default();
        let db_name = db_name.split('?').next().unwrap_or_default();
        if !db_name.ends_with("_test") {
            return Err(format!(
                "Test environment requires database name to end with '_test', but got: '{db_name}'"
            ));
        }
    }

    Ok(url)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stdout)
        .without_time()
        .with_target(false)
        .with_env_filter("migration=info,sqlx=warn")
        .init();

    let args = Args::parse();

    let Some(command) = MigrationCommand::parse(&args.command) else {
        eprintln!(
            "Unknown command: {}. Use: up | down | fresh | reset | refresh | status",
            args.command
        );
        std::process::exit(2);
    };

    let url = match resolve_url(args.env, args.db) {
        Ok(url) => url,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };

    let conn = match Database::connect(&url).await {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("❌ Failed to connect: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = migrate(&conn, command).await {
        eprintln!("❌ Migration failed: {e}");
        std::process::exit(1);
    }
}
