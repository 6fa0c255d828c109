use clap::Args;

#[derive(Args)]
pub struct LoginArgs {
    #[arg(long)]
    pub username: String,
    #[arg(long, help = "Prompted for when omitted")]
    pub password: Option<String>,
}
