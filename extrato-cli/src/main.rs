use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{Duration, Local, NaiveDate};
use clap::{Parser, Subcommand};

mod config;
mod sync;

use extrato_core::Period;
use sync::{RunSummary, SyncOptions};

#[derive(Parser, Debug)]
#[command(name = "extrato", version, about = "Sincroniza extratos bancários via Open Banking")]
struct Cli {
    /// Caminho do arquivo de configuração (fundos, credenciais, endpoints)
    #[arg(long, default_value = "extrato.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Busca saldos e transações e gera os extratos (XLSX + PDF) por conta
    Sync {
        /// Data inicial (YYYY-MM-DD; padrão: 7 dias atrás)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Data final (YYYY-MM-DD; padrão: hoje)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Pasta de saída dos arquivos gerados
        #[arg(long, default_value = ".")]
        out: PathBuf,

        /// Processar apenas estes fundos (ids da configuração; repetível)
        #[arg(long)]
        fund: Vec<String>,

        /// Transações por página
        #[arg(long, default_value_t = 1000)]
        page_size: usize,
    },

    /// Lista os fundos configurados
    Funds,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Sync {
            from,
            to,
            out,
            fund,
            page_size,
        } => {
            let config = config::load_config(&cli.config)?;

            let to = to.unwrap_or_else(|| Local::now().date_naive());
            let from = from.unwrap_or(to - Duration::days(7));
            if from > to {
                bail!("invalid period: {from} > {to}");
            }

            fs::create_dir_all(&out).with_context(|| format!("create {}", out.display()))?;

            let opts = SyncOptions {
                period: Period { from, to },
                out_dir: out,
                page_size,
                funds: fund,
            };

            println!("Período: {} a {}", from.format("%d/%m/%Y"), to.format("%d/%m/%Y"));
            let summary = sync::run(&config, &opts).await;
            print_summary(&summary);
        }

        Command::Funds => {
            let config = config::load_config(&cli.config)?;
            for (id, fund) in &config.funds {
                println!("{id}: {} (CNPJ {})", fund.name, fund.credential.cnpj);
            }
        }
    }

    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("\nResumo do processamento");

    if !summary.with_transactions.is_empty() {
        println!(
            "\nFundos COM transações no período ({}):",
            summary.with_transactions.len()
        );
        for fund in &summary.with_transactions {
            println!("  - {fund}");
        }
    }

    if !summary.zero_transactions.is_empty() {
        println!(
            "\nFundos SEM transações no período ({}):",
            summary.zero_transactions.len()
        );
        for fund in &summary.zero_transactions {
            println!("  - {fund}");
        }
        println!("  (arquivos gerados apenas com os saldos atuais)");
    }

    if !summary.failed.is_empty() {
        println!("\nFundos com ERRO ({}):", summary.failed.len());
        for (fund, error) in &summary.failed {
            println!("  - {fund}: {error}");
        }
    }

    if !summary.files.is_empty() {
        println!("\nArquivos gerados ({}):", summary.files.len());
        for file in &summary.files {
            println!("  {}", file.display());
        }
    }
}
