use clap::Args;

#[derive(Args)]
pub struct ItemIdArgs {
    #[arg(help = "Item ID")]
    pub id: i64,
}

#[derive(Args)]
pub struct AddArgs {
    #[arg(help = "Item title")]
    pub title: String,
}

#[derive(Args)]
pub struct UpdateArgs {
    #[arg(help = "Item ID")]
    pub id: i64,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long, help = "Set the completion flag (true/false)")]
    pub completed: Option<bool>,
}
