use clap::Args;

#[derive(Args)]
pub struct ListArgs {
    #[arg(long, help = "Print records as JSON")]
    pub json: bool,
    #[arg(long, help = "Only records carrying this tag")]
    pub tag: Option<String>,
}

#[derive(Args)]
pub struct AddArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub password: Option<String>,
    #[arg(long)]
    pub url: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long, value_delimiter = ',')]
    pub tags: Vec<String>,
    #[arg(long, help = "passwords, notes, cards, api-keys or team")]
    pub category: Option<String>,
    #[arg(long)]
    pub favorite: bool,
    #[arg(long, help = "Identifier of a secret holding the password")]
    pub external_secret_ref: Option<String>,
}

#[derive(Args)]
pub struct UpdateArgs {
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub password: Option<String>,
    #[arg(long)]
    pub url: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long, value_delimiter = ',')]
    pub tags: Option<Vec<String>>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub favorite: Option<bool>,
}

#[derive(Args)]
pub struct RemoveArgs {
    pub id: String,
}

#[derive(Args)]
pub struct ShowArgs {
    pub id: String,
    #[arg(long, help = "Include the password in the output")]
    pub reveal: bool,
}

#[derive(Args)]
pub struct OtpArgs {
    pub id: String,
}

#[derive(Args)]
pub struct CopyArgs {
    pub id: String,
}
