use std::net::IpAddr;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the chat server, relaying lines between connected participants.
    Server(ServerArgs),
    /// Connect to a server and chat from the terminal.
    Client(ClientArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// IPv4 or IPv6 address to listen on.
    #[arg(short, long)]
    pub address: IpAddr,

    /// Port to listen on. Use 0 for an ephemeral port.
    #[arg(short, long)]
    pub port: u16,
}

#[derive(Args, Debug, Clone)]
pub struct ClientArgs {
    /// Address of the server.
    #[arg(short, long)]
    pub address: IpAddr,

    /// Port of the server.
    #[arg(short, long)]
    pub port: u16,

    /// Display name, truncated to 16 bytes.
    #[arg(short, long)]
    pub name: String,
}
