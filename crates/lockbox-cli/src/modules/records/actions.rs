use std::sync::Arc;

use lockbox_core::{
    normalize_tag, secret_identifier, Category, OtpConfig, RecordPatch, VaultKind, VaultRecord,
};
use lockbox_store::{FileSecretStore, SessionError, VaultAccess, VaultStore};
use tracing::debug;

use super::args::{AddArgs, CopyArgs, ListArgs, OtpArgs, RemoveArgs, ShowArgs, UpdateArgs};
use super::format::{print_records_table, record_view};
use crate::modules::system::{load_state, store_dir, CliConfig};

pub(crate) struct CommandContext<'a> {
    pub config: &'a CliConfig,
    pub kind: VaultKind,
    pub master_password: Option<String>,
    pub store: VaultStore,
}

impl<'a> CommandContext<'a> {
    pub(crate) fn new(
        config: &'a CliConfig,
        kind: VaultKind,
        master_password: Option<String>,
    ) -> anyhow::Result<Self> {
        let client = Arc::new(FileSecretStore::new(store_dir(config)?));
        Ok(Self {
            config,
            kind,
            master_password,
            store: VaultStore::with_config(client, config.store_config()),
        })
    }

    /// Work vaults need no key; personal vaults prompt for the master
    /// password unless one was supplied.
    pub(crate) async fn access(&self) -> anyhow::Result<VaultAccess> {
        if self.kind == VaultKind::Work {
            return Ok(VaultAccess::Work);
        }
        let material = load_state()?;
        let password = match &self.master_password {
            Some(password) => password.clone(),
            None => crate::prompt_password("Master password: ")?,
        };
        let key = material.unlock_key(&password).await.map_err(|err| match err {
            SessionError::InvalidPassword => anyhow::anyhow!("invalid master password"),
            other => anyhow::anyhow!(other),
        })?;
        Ok(VaultAccess::Personal(Arc::new(key)))
    }
}

pub(crate) fn handle_path(config: &CliConfig, kind: VaultKind) -> anyhow::Result<()> {
    let key = secret_identifier(&config.scope(), kind.as_str())?;
    println!("{key}");
    Ok(())
}

pub(crate) async fn handle_list(args: ListArgs, ctx: &CommandContext<'_>) -> anyhow::Result<()> {
    let scope = ctx.config.scope();
    let mut records = if scope.is_configured() {
        let access = ctx.access().await?;
        ctx.store.list(&scope, &access).await?
    } else {
        eprintln!("account_id and region are not configured; nothing to list");
        Vec::new()
    };
    if let Some(tag) = args.tag.as_deref().and_then(normalize_tag) {
        records.retain(|record| record.tags.contains(&tag));
    }
    records.sort_by(|a, b| {
        a.title
            .to_lowercase()
            .cmp(&b.title.to_lowercase())
            .then_with(|| a.id.cmp(&b.id))
    });

    if args.json {
        let views: Vec<VaultRecord> = records
            .iter()
            .map(|record| record_view(record, false))
            .collect();
        println!("{}", serde_json::to_string_pretty(&views)?);
    } else {
        print_records_table(&records);
    }
    Ok(())
}

pub(crate) async fn handle_add(args: AddArgs, ctx: &CommandContext<'_>) -> anyhow::Result<()> {
    let category = args
        .category
        .as_deref()
        .map(str::parse::<Category>)
        .transpose()?
        .unwrap_or_default();
    let record = VaultRecord {
        username: args.username,
        password: args.password,
        url: args.url,
        notes: args.notes,
        category,
        favorite: args.favorite,
        external_secret_ref: args.external_secret_ref,
        ..VaultRecord::new(args.title)
    }
    .with_tags(args.tags);

    let access = ctx.access().await?;
    let created = ctx.store.create(&ctx.config.scope(), &access, record).await?;
    println!("{}", created.id);
    Ok(())
}

pub(crate) async fn handle_update(
    args: UpdateArgs,
    ctx: &CommandContext<'_>,
) -> anyhow::Result<()> {
    let patch = RecordPatch {
        title: args.title,
        username: args.username,
        password: args.password,
        url: args.url,
        notes: args.notes,
        tags: args.tags,
        category: args
            .category
            .as_deref()
            .map(str::parse::<Category>)
            .transpose()?,
        favorite: args.favorite,
        ..RecordPatch::default()
    };
    if patch.is_empty() {
        anyhow::bail!("nothing to update");
    }
    let access = ctx.access().await?;
    let updated = ctx
        .store
        .update(&ctx.config.scope(), &access, &args.id, patch)
        .await?;
    println!("{}", updated.id);
    Ok(())
}

pub(crate) async fn handle_remove(
    args: RemoveArgs,
    ctx: &CommandContext<'_>,
) -> anyhow::Result<()> {
    let access = ctx.access().await?;
    let removed = ctx
        .store
        .remove(&ctx.config.scope(), &access, &args.id)
        .await?;
    if removed.is_none() {
        debug!(event = "record_already_absent", id = %args.id);
    }
    Ok(())
}

pub(crate) async fn handle_show(args: ShowArgs, ctx: &CommandContext<'_>) -> anyhow::Result<()> {
    let access = ctx.access().await?;
    let record = find_record(ctx, &access, &args.id).await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&record_view(&record, args.reveal))?
    );
    Ok(())
}

pub(crate) async fn handle_otp(args: OtpArgs, ctx: &CommandContext<'_>) -> anyhow::Result<()> {
    let access = ctx.access().await?;
    let record = find_record(ctx, &access, &args.id).await?;
    let otp = OtpConfig::from_record(&record)
        .ok_or_else(|| anyhow::anyhow!("record has no one-time password configured"))?;
    let now = now_millis();
    println!("{} ({}s)", otp.code_at(now), otp.seconds_remaining(now));
    Ok(())
}

pub(crate) async fn handle_copy(args: CopyArgs, ctx: &CommandContext<'_>) -> anyhow::Result<()> {
    let access = ctx.access().await?;
    let record = find_record(ctx, &access, &args.id).await?;
    let password = ctx
        .store
        .reveal_password(&record)
        .await?
        .ok_or_else(|| anyhow::anyhow!("record has no password"))?;
    let mut clipboard = arboard::Clipboard::new()?;
    clipboard.set_text(password)?;
    eprintln!("copied password for {}", record.title);
    Ok(())
}

/// Exact id first, then a unique case-insensitive title match.
async fn find_record(
    ctx: &CommandContext<'_>,
    access: &VaultAccess,
    needle: &str,
) -> anyhow::Result<VaultRecord> {
    let records = ctx.store.list(&ctx.config.scope(), access).await?;
    select_record(records, needle)
}

fn select_record(records: Vec<VaultRecord>, needle: &str) -> anyhow::Result<VaultRecord> {
    if let Some(record) = records.iter().find(|record| record.id == needle) {
        return Ok(record.clone());
    }
    let mut matches = records
        .into_iter()
        .filter(|record| record.title.eq_ignore_ascii_case(needle));
    match (matches.next(), matches.next()) {
        (Some(record), None) => Ok(record),
        (Some(_), Some(_)) => anyhow::bail!("several records are titled {needle}; use the id"),
        (None, _) => anyhow::bail!("record not found: {needle}"),
    }
}

fn now_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
}
