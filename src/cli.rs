use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "starship")]
#[command(about = "Backend service scaffold: settings, MySQL pools, migrations and a web server")]
pub struct Args {
    /// The address to listen on for HTTP requests
    #[arg(short, long, default_value = "0.0.0.0")]
    pub address: String,

    /// The port to listen on for HTTP requests
    #[arg(short, long, default_value_t = 3333)]
    pub port: u16,

    /// Print the route table as JSON and exit
    #[arg(short, long)]
    pub routes: bool,

    /// Open the database pools and run migrations
    #[arg(short, long)]
    pub database: bool,
}
