use std::path::Path;

use anyhow::Context;
use chrono::{Duration, Utc};
use colored::Colorize;
use giveth_chain::{Script, ScriptedGateway, SubmittedCall};
use giveth_delegation::{DelegationConfig, DonationService, ObserverEvent, RecordingObserver, TxOutcome};
use giveth_ledger::InMemoryDonationStore;
use giveth_pledge::{allocate, Allocation, PledgeFragment, PledgeNote};
use giveth_types::{
    Address, AdminId, Amount, DelegateTarget, Donation, DonationId, DonationStatus, EntityAccount, EntityKind,
    NewDonation, Party, PledgeId,
};
use serde::{Deserialize, Serialize};

use crate::cli::*;

const SIM_GIVER: &str = "0x00000000000000000000000000000000000000a1";
const SIM_GIVER_ID: AdminId = 1;
const SIM_DAC: &str = "0x00000000000000000000000000000000000000d1";
const SIM_DAC_ID: AdminId = 2;

/// One entry of a donations input file.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FragmentInput {
    id: DonationId,
    pledge_id: PledgeId,
    amount: Amount,
}

impl PledgeFragment for FragmentInput {
    fn donation_id(&self) -> &DonationId {
        &self.id
    }

    fn pledge_id(&self) -> PledgeId {
        self.pledge_id
    }

    fn available(&self) -> &Amount {
        &self.amount
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AllocateReport {
    allocation: Allocation,
    shortfall: Amount,
    notes: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulationReport {
    outcome: Option<TxOutcome>,
    error: Option<String>,
    events: Vec<ObserverEvent>,
    calls: Vec<SubmittedCall>,
    ledger: Vec<Donation>,
}

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Allocate(args) => cmd_allocate(args, format),
        Command::Encode(args) => cmd_encode(args, format),
        Command::Decode(args) => cmd_decode(args, format),
        Command::Simulate(args) => cmd_simulate(args, config, format).await,
        Command::Config(_) => cmd_config(&config, format),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<DelegationConfig> {
    let config = match path {
        Some(path) => DelegationConfig::load(path)?,
        None => DelegationConfig::default().with_env()?,
    };
    Ok(config)
}

fn read_fragments(path: &Path) -> anyhow::Result<Vec<FragmentInput>> {
    let input = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse_fragments(&input).with_context(|| format!("parsing {}", path.display()))
}

fn parse_fragments(input: &str) -> anyhow::Result<Vec<FragmentInput>> {
    Ok(serde_json::from_str(input)?)
}

fn parse_amount(value: &str) -> anyhow::Result<Amount> {
    value.parse().with_context(|| format!("invalid amount {value:?}"))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_allocate(args: AllocateArgs, format: OutputFormat) -> anyhow::Result<()> {
    let fragments = read_fragments(&args.donations)?;
    let target = parse_amount(&args.amount)?;
    let allocation = allocate(&fragments, &target);
    let report = AllocateReport {
        shortfall: allocation.shortfall(),
        notes: allocation.encoded_notes()?,
        allocation,
    };

    if let OutputFormat::Json = format {
        return print_json(&report);
    }

    println!("Allocating {} across {} donations", target.to_string().bold(), fragments.len());
    for consumed in &report.allocation.consumed {
        let marker = if consumed.fully_donated {
            "full".green()
        } else {
            "split".yellow()
        };
        println!(
            "  {} pledge {} {} ({})",
            consumed.donation_id.as_str().cyan(),
            consumed.pledge_id,
            consumed.contribution,
            marker
        );
    }
    for (pledge, note) in report.allocation.pledges.iter().zip(&report.notes) {
        println!("  note {} = {} from pledge {}", note.dimmed(), pledge.amount, pledge.pledge_id);
    }
    if report.shortfall.is_zero() {
        println!("{} Total {}", "✓".green().bold(), report.allocation.total);
    } else {
        println!(
            "{} Total {} (short by {})",
            "!".yellow().bold(),
            report.allocation.total,
            report.shortfall.to_string().yellow()
        );
    }
    Ok(())
}

fn cmd_encode(args: EncodeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let note = PledgeNote::new(parse_amount(&args.amount)?, PledgeId(args.pledge_id));
    let encoded = note.encode()?;
    match format {
        OutputFormat::Json => print_json(&encoded),
        OutputFormat::Text => {
            println!("{encoded}");
            Ok(())
        }
    }
}

fn cmd_decode(args: DecodeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let notes = args
        .notes
        .iter()
        .map(|note| PledgeNote::decode(note).with_context(|| format!("decoding {note}")))
        .collect::<anyhow::Result<Vec<_>>>()?;

    if let OutputFormat::Json = format {
        return print_json(&notes);
    }
    for note in &notes {
        println!("pledge {} amount {}", note.pledge_id.to_string().cyan(), note.amount.to_string().bold());
    }
    Ok(())
}

/// Donations held by a giver and delegated to one DAC, oldest first.
fn simulated_donations(fragments: &[FragmentInput]) -> anyhow::Result<Vec<Donation>> {
    let giver_address: Address = SIM_GIVER.parse()?;
    let giver = Party::new(SIM_GIVER_ID, giver_address.as_str(), EntityKind::Giver);
    let dac = Party::new(SIM_DAC_ID, "simulated-dac", EntityKind::Dac)
        .with_account(EntityAccount::new(SIM_DAC.parse()?));

    let start = Utc::now() - Duration::seconds(fragments.len() as i64);
    Ok(fragments
        .iter()
        .enumerate()
        .map(|(i, fragment)| {
            let mut new = NewDonation::new(
                fragment.amount.clone(),
                giver_address.clone(),
                giver.clone(),
                DonationStatus::Waiting,
            );
            new.pledge_id = fragment.pledge_id;
            new.delegate = Some(dac.clone());
            new.into_donation(fragment.id.clone(), start + Duration::seconds(i as i64))
        })
        .collect())
}

fn simulation_scripts(args: &SimulateArgs) -> Vec<Script> {
    if args.fail_before_hash {
        vec![Script::FailBeforeHash("transaction underpriced".into())]
    } else if args.unknown_tx {
        vec![Script::FailAfterHash("unknown transaction".into())]
    } else {
        Vec::new()
    }
}

async fn cmd_simulate(args: SimulateArgs, config: DelegationConfig, format: OutputFormat) -> anyhow::Result<()> {
    let donations = simulated_donations(&read_fragments(&args.donations)?)?;
    let amount = parse_amount(&args.amount)?;
    let target = match args.kind {
        ProjectKind::Campaign => DelegateTarget::campaign(format!("campaign-{}", args.project), args.project),
        ProjectKind::Milestone => DelegateTarget::milestone(format!("milestone-{}", args.project), args.project),
    };

    let store = InMemoryDonationStore::new();
    store.seed(donations.clone())?;
    let gateway = ScriptedGateway::with_scripts(simulation_scripts(&args));
    let service = DonationService::new(store, gateway, config);
    let observer = RecordingObserver::new();

    let result = service
        .delegate_multiple(&donations, &amount, &target, args.comment.as_deref(), &observer)
        .await;

    let (outcome, error) = match result {
        Ok(outcome) => (Some(outcome), None),
        Err(error) => (None, Some(error.to_string())),
    };
    let report = SimulationReport {
        outcome,
        error,
        events: observer.events(),
        calls: service.gateway().calls()?,
        ledger: service.store().all()?,
    };

    if let OutputFormat::Json = format {
        return print_json(&report);
    }

    for call in &report.calls {
        println!("{} {}", "call".bold(), call);
    }
    for event in &report.events {
        match event {
            ObserverEvent::Created(link) => println!("  {} {}", "created".cyan(), link),
            ObserverEvent::Success(link) => println!("  {} {}", "mined".green(), link),
            ObserverEvent::Error(message) => println!("  {} {}", "error".red(), message),
            ObserverEvent::Cancelled => println!("  {}", "cancelled".yellow()),
        }
    }
    println!("{}", "Ledger".bold());
    for donation in &report.ledger {
        let intended = donation
            .intended_project
            .as_ref()
            .map(|p| format!(" -> {} {}", p.kind, p.admin_id))
            .unwrap_or_default();
        let tx = donation
            .tx_hash
            .as_ref()
            .map(|h| format!(" tx {}", h.short()))
            .unwrap_or_default();
        println!(
            "  {} pledge {} remaining {} [{}]{}{}",
            donation.id.as_str().cyan(),
            donation.pledge_id,
            donation.amount_remaining,
            donation.status,
            intended,
            tx.dimmed()
        );
    }

    match (&report.outcome, &report.error) {
        (Some(TxOutcome::Confirmed { .. }), _) => println!("{} Delegation confirmed", "✓".green().bold()),
        (Some(TxOutcome::Unconfirmed { .. }), _) => {
            println!("{} Delegation submitted; confirmation not observed", "!".yellow().bold())
        }
        (Some(TxOutcome::Cancelled), _) => println!("{} Delegation cancelled", "!".yellow().bold()),
        (None, Some(error)) => println!("{} {}", "✗".red().bold(), error),
        (None, None) => {}
    }
    Ok(())
}

fn cmd_config(config: &DelegationConfig, format: OutputFormat) -> anyhow::Result<()> {
    if let OutputFormat::Json = format {
        return print_json(config);
    }
    println!("explorer_url = {}", config.explorer_url.bold());
    match &config.liquid_pledging_address {
        Some(address) => println!("liquid_pledging_address = {}", address.to_string().bold()),
        None => println!("liquid_pledging_address = {}", "(not set)".dimmed()),
    }
    println!("extra_gas = {}", config.extra_gas);
    println!("delegate_count_limit = {}", config.delegate_count_limit);
    Ok(())
}
