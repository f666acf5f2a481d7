use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use bladesroll_engine::display::{
    action_options, effect_options, engagement_options, modifier_options, position_options,
    tier_options, Catalog, Translate,
};
use bladesroll_engine::{
    builtin_character, compute_dice_pool, with_timeout, CharacterSheet, DiceRoller, DialogOutcome,
    Effect, Position, Reading, RecordDefaults, Resolved, RollIntentResolver, RulesetConfig,
    SelectionForm,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::Level;

#[derive(Copy, Clone, ValueEnum)]
enum Kind {
    Action,
    Fortune,
    GatherInfo,
    IndulgeVice,
    Engagement,
    AcquireAsset,
    Resistance,
}

impl Kind {
    /// Radio id the selection form would submit.
    fn form_id(self) -> Option<&'static str> {
        match self {
            Kind::Action => Some("actionRoll"),
            Kind::Fortune => Some("fortune"),
            Kind::GatherInfo => Some("gatherInfo"),
            Kind::IndulgeVice => Some("indulgeVice"),
            Kind::Engagement => Some("engagement"),
            Kind::AcquireAsset => Some("acquireAsset"),
            Kind::Resistance => None,
        }
    }
}

#[derive(Args)]
struct SheetArgs {
    /// Character sheet JSON file
    #[arg(long, conflicts_with = "character")]
    sheet: Option<PathBuf>,
    /// Built-in character id
    #[arg(long, default_value = "cutter")]
    character: String,
    /// Ruleset file (.yaml or .json); defaults to the built-in ruleset
    #[arg(long)]
    ruleset: Option<PathBuf>,
}

impl SheetArgs {
    fn load(&self) -> Result<(CharacterSheet, RulesetConfig)> {
        let sheet = match &self.sheet {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read sheet JSON: {}", path.display()))?;
                CharacterSheet::from_json(&text)
                    .with_context(|| format!("failed to parse sheet JSON: {}", path.display()))?
            }
            None => builtin_character(&self.character)?,
        };
        let ruleset = match &self.ruleset {
            Some(path) => RulesetConfig::load(path)?,
            None => RulesetConfig::builtin("blades")?,
        };
        Ok((sheet, ruleset))
    }
}

#[derive(Subcommand)]
enum Cmd {
    /// Print the dice pool of every attribute, skill and vice
    Pool {
        #[command(flatten)]
        sheet: SheetArgs,
        /// Print JSON instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the option markup of the selection form
    Options {
        #[command(flatten)]
        sheet: SheetArgs,
        /// Translation catalog JSON; defaults to the built-in English one
        #[arg(long)]
        lang: Option<PathBuf>,
    },
    /// Roll for a subject with the reference d6 evaluator
    Roll {
        #[command(flatten)]
        sheet: SheetArgs,
        /// Attribute or skill to roll
        #[arg(long)]
        subject: String,
        /// Defaults to an action roll for skills and resistance for attributes
        #[arg(long, value_enum)]
        kind: Option<Kind>,
        /// Dice modifier
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        modifier: String,
        #[arg(long, default_value = "risky")]
        position: String,
        #[arg(long, default_value = "standard")]
        effect: String,
        /// Engagement dice quantity
        #[arg(long, default_value = "0")]
        dice: String,
        /// Crew tier for asset acquisition
        #[arg(long, default_value = "0")]
        tier: String,
        #[arg(long, default_value = "")]
        note: String,
        /// RNG seed for determinism
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Give up on the evaluator after this many milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Show what the host does when creating a record of this type
    Record {
        /// Record type, e.g. character, crew, clock
        #[arg(long = "type")]
        record_type: String,
        #[arg(long)]
        ruleset: Option<PathBuf>,
    },
}

#[derive(Parser)]
#[command(name = "bladesroll")]
#[command(about = "Dice pools and roll dispatch for Blades-style character sheets")]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Cmd,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Cmd::Pool { sheet, json } => {
            let (sheet, ruleset) = sheet.load()?;
            let pool = compute_dice_pool(&sheet, &ruleset)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&pool)?);
            } else {
                for (key, entry) in pool.iter() {
                    println!("{:<12} {}d", key, entry.dice);
                }
            }
        }
        Cmd::Options { sheet, lang } => {
            let (sheet, ruleset) = sheet.load()?;
            let catalog = match lang {
                Some(path) => {
                    let text = fs::read_to_string(&path)
                        .with_context(|| format!("failed to read catalog: {}", path.display()))?;
                    Catalog::from_json(&text)?
                }
                None => Catalog::builtin("en")?,
            };
            let range = ruleset.modifier_range;
            println!("{}", modifier_options(range.min, range.max, range.default));
            println!("{}", action_options(&sheet, &catalog));
            println!("{}", position_options(Position::default(), &catalog));
            println!("{}", effect_options(Effect::default(), &catalog));
            println!("{}", engagement_options(ruleset.max_engagement_dice));
            println!("{}", tier_options(ruleset.max_tier));
        }
        Cmd::Roll {
            sheet,
            subject,
            kind,
            modifier,
            position,
            effect,
            dice,
            tier,
            note,
            seed,
            timeout_ms,
            json,
        } => {
            let (sheet, ruleset) = sheet.load()?;
            let kind = kind.unwrap_or(match sheet.attribute_of(subject.trim()) {
                Some(_) => Kind::Action,
                None => Kind::Resistance,
            });
            let form = SelectionForm {
                subject,
                modifier,
                kind: kind.form_id().map(str::to_string),
                position,
                effect,
                quantity: dice,
                tier,
                note,
            };
            let resolver = RollIntentResolver::new(&ruleset);
            let outcome = DialogOutcome::Submitted(form);
            let roller = DiceRoller::from_seed(seed);
            let resolved = match timeout_ms {
                Some(ms) => {
                    let timed = with_timeout(roller, Duration::from_millis(ms));
                    resolver.roll_for_sheet(&sheet, outcome, &timed).await?
                }
                None => resolver.roll_for_sheet(&sheet, outcome, &roller).await?,
            };
            if let Some(resolved) = resolved {
                if json {
                    println!("{}", serde_json::to_string_pretty(&resolved)?);
                } else {
                    let catalog = Catalog::builtin("en")?;
                    print_roll(&resolved, &catalog);
                }
            }
        }
        Cmd::Record {
            record_type,
            ruleset,
        } => {
            let ruleset = match ruleset {
                Some(path) => RulesetConfig::load(&path)?,
                None => RulesetConfig::builtin("blades")?,
            };
            let defaults = RecordDefaults::for_record(&record_type, &ruleset);
            println!("{} link_token={}", record_type, defaults.link_token);
        }
    }
    Ok(())
}

fn print_roll(resolved: &Resolved, tr: &impl Translate) {
    let request = &resolved.request;
    let result = &resolved.result;
    let mut header = format!("{}: {}d", tr.translate(&request.label), request.dice);
    if let (Some(position), Some(effect)) = (request.position(), request.effect()) {
        header.push_str(&format!(" ({}/{})", position, effect));
    }
    println!("{}", header);
    println!(
        "rolled {:?} kept={} => {}",
        result.rolls,
        result.kept,
        tr.translate(result.outcome.label_key())
    );
    match result.reading {
        Reading::Outcome => {}
        Reading::StressCost { stress } => println!("stress cost: {}", stress),
        Reading::StressCleared {
            cleared,
            overindulged,
        } => println!(
            "stress cleared: {}{}",
            cleared,
            if overindulged { " (overindulged)" } else { "" }
        ),
        Reading::StartingPosition { position } => println!("starting position: {}", position),
        Reading::AssetQuality { quality } => println!("asset quality: {}", quality),
    }
    if !request.note.is_empty() {
        println!("note: {}", request.note);
    }
}
