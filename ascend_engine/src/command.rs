//! Command module
//!
//! Admin commands accepted by the `ascend` REPL, and their execution against a
//! [`Progression`].
use std::fmt::Write as _;

use colored::Colorize;
use uuid::Uuid;
use variantly;

use crate::api::Progression;
use crate::error::{ProgressionError, ProgressionResult};
use crate::experience::{ClaimOutcome, GrantOutcome};
use crate::quest::QuestOutcome;

/// Commands that can be executed by an administrator.
#[derive(Debug, Clone, PartialEq, variantly::Variantly)]
pub enum Command {
    AddExp {
        player: String,
        category: String,
        amount: f64,
    },
    Claim {
        player: String,
        category: String,
    },
    Help,
    Learn {
        player: String,
        category: String,
        skill: String,
    },
    Modifiers(String),
    Quest {
        player: String,
        category: String,
        level: u32,
    },
    Quit,
    Reload,
    ResetSkills {
        player: String,
        category: String,
    },
    Save,
    SetLevel {
        player: String,
        category: String,
        level: u32,
    },
    Stats(String),
    Unknown,
    /// Known verb, malformed arguments; carries the usage line.
    Usage(&'static str),
}

pub const USAGE_ADDEXP: &str = "addexp <player> <category> <amount>";
pub const USAGE_SETLEVEL: &str = "setlevel <player> <category> <level>";
pub const USAGE_QUEST: &str = "quest <player> <category> <level>";

/// Every command verb, for help output and completion.
pub const COMMAND_VERBS: &[&str] = &[
    "addexp",
    "claim",
    "help",
    "learn",
    "modifiers",
    "quest",
    "quit",
    "reload",
    "resetskills",
    "save",
    "setlevel",
    "stats",
];

/// Parses an input string and returns a corresponding `Command` if recognized.
pub fn parse_command(input: &str) -> Command {
    let words: Vec<&str> = input.split_whitespace().collect();
    match words.as_slice() {
        ["stats", player] => Command::Stats((*player).to_string()),
        ["addexp" | "giveexp", player, category, amount] => match amount.parse::<f64>() {
            Ok(amount) => Command::AddExp {
                player: (*player).to_string(),
                category: (*category).to_string(),
                amount,
            },
            Err(_) => Command::Usage(USAGE_ADDEXP),
        },
        ["addexp" | "giveexp", ..] => Command::Usage(USAGE_ADDEXP),
        ["setlevel", player, category, level] => match level.parse::<u32>() {
            Ok(level) => Command::SetLevel {
                player: (*player).to_string(),
                category: (*category).to_string(),
                level,
            },
            Err(_) => Command::Usage(USAGE_SETLEVEL),
        },
        ["setlevel", ..] => Command::Usage(USAGE_SETLEVEL),
        ["resetskills", player, category] => Command::ResetSkills {
            player: (*player).to_string(),
            category: (*category).to_string(),
        },
        ["resetskills", ..] => Command::Usage("resetskills <player> <category>"),
        ["reload"] => Command::Reload,
        ["claim" | "levelup", player, category] => Command::Claim {
            player: (*player).to_string(),
            category: (*category).to_string(),
        },
        ["learn", player, category, skill] => Command::Learn {
            player: (*player).to_string(),
            category: (*category).to_string(),
            skill: (*skill).to_string(),
        },
        ["learn", ..] => Command::Usage("learn <player> <category> <skill>"),
        ["quest", player, category, level] => match level.parse::<u32>() {
            Ok(level) => Command::Quest {
                player: (*player).to_string(),
                category: (*category).to_string(),
                level,
            },
            Err(_) => Command::Usage(USAGE_QUEST),
        },
        ["quest", ..] => Command::Usage(USAGE_QUEST),
        ["modifiers" | "mods", player] => Command::Modifiers((*player).to_string()),
        ["save"] => Command::Save,
        ["help" | "?"] => Command::Help,
        ["quit" | "exit"] => Command::Quit,
        _ => Command::Unknown,
    }
}

/// Parse a player id.
///
/// # Errors
/// Returns [`ProgressionError::InvalidPlayer`] when `raw` is not a UUID.
pub fn parse_player(raw: &str) -> ProgressionResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ProgressionError::InvalidPlayer(raw.to_string()))
}

/// Run a command and render its result for the terminal.
pub fn execute(progression: &Progression, command: &Command) -> String {
    match try_execute(progression, command) {
        Ok(text) => text,
        Err(err) => err.to_string().red().to_string(),
    }
}

/// Run a command, surfacing lookup failures as errors.
///
/// # Errors
/// Returns a [`ProgressionError`] for malformed players and unknown categories or skills.
pub fn try_execute(progression: &Progression, command: &Command) -> ProgressionResult<String> {
    let text = match command {
        Command::Stats(player) => stats(progression, parse_player(player)?),
        Command::AddExp {
            player,
            category,
            amount,
        } => {
            let player = parse_player(player)?;
            let outcome = progression.try_grant_experience(player, category, *amount)?;
            describe_grant(category, &outcome)
        },
        Command::SetLevel {
            player,
            category,
            level,
        } => {
            let level = progression
                .experience()
                .set_level(parse_player(player)?, category, *level)?;
            format!("{category} set to level {}", level.to_string().green())
        },
        Command::ResetSkills { player, category } => {
            let player = parse_player(player)?;
            require_category(progression, category)?;
            let refund = progression.skills().reset_all(player, category);
            format!("{category} skills reset, {} point(s) refunded", refund.to_string().yellow())
        },
        Command::Reload => {
            let loaded = progression.reload_config();
            format!(
                "{} {} categories, {} action sets",
                "Configuration reloaded:".green(),
                loaded.categories.len(),
                loaded.action_sets.len()
            )
        },
        Command::Claim { player, category } => {
            let player = parse_player(player)?;
            require_category(progression, category)?;
            describe_claim(category, &progression.experience().claim_level_up(player, category))
        },
        Command::Learn {
            player,
            category,
            skill,
        } => {
            let player = parse_player(player)?;
            let def = progression
                .categories()
                .get(category)
                .ok_or_else(|| ProgressionError::UnknownCategory(category.clone()))?;
            if def.skill(skill).is_none() {
                return Err(ProgressionError::UnknownSkill {
                    category: category.clone(),
                    skill: skill.clone(),
                });
            }
            if progression.skills().activate(player, category, skill) {
                let rank = progression.skills().skill_rank(player, category, skill);
                format!("{skill} is now rank {}", rank.to_string().green())
            } else {
                format!("{skill} cannot be raised (not enough points or max rank)")
                    .yellow()
                    .to_string()
            }
        },
        Command::Quest {
            player,
            category,
            level,
        } => {
            let player = parse_player(player)?;
            require_category(progression, category)?;
            describe_quest(category, *level, progression.quests().complete(player, category, *level))
        },
        Command::Modifiers(player) => modifiers(progression, parse_player(player)?),
        Command::Save => {
            let failures = progression.save_all();
            if failures == 0 {
                "All cached players saved.".green().to_string()
            } else {
                format!("{failures} player record(s) failed to save").red().to_string()
            }
        },
        Command::Help => help_text(),
        Command::Quit => "Goodbye.".to_string(),
        Command::Usage(usage) => format!("usage: {usage}").yellow().to_string(),
        Command::Unknown => "Unknown command. Type 'help' for a list.".italic().to_string(),
    };
    Ok(text)
}

fn require_category(progression: &Progression, category: &str) -> ProgressionResult<()> {
    if progression.has_category(category) {
        Ok(())
    } else {
        Err(ProgressionError::UnknownCategory(category.to_string()))
    }
}

fn stats(progression: &Progression, player: Uuid) -> String {
    let record = progression.store().snapshot(player);
    let mut out = format!("=== Progression for {player} ===").bright_yellow().bold().to_string();
    for category in progression.categories().all() {
        let Some(progress) = record.progress(&category.id) else {
            continue;
        };
        let mut line = format!(
            "\n{}: {} ({:.0}/{:.0} EXP) [{} SP]",
            category.label().cyan(),
            format!("Level {}", progress.level).green(),
            progress.current_exp,
            progress.exp_for_next_level,
            record.points(&category.id).to_string().yellow()
        );
        if progress.pending_level_ups > 0 {
            let _ = write!(line, " {}", format!("+{} pending", progress.pending_level_ups).magenta());
        }
        if !progress.can_gain_exp {
            let _ = write!(line, " {}", "[blocked]".red());
        }
        out.push_str(&line);
    }
    if record.categories.is_empty() {
        out.push_str(&"\nNo progress recorded.".dimmed().to_string());
    }
    out
}

fn modifiers(progression: &Progression, player: Uuid) -> String {
    let totals = progression.modifiers().compute(player);
    if totals.is_empty() {
        return "No active modifiers.".dimmed().to_string();
    }
    let mut out = format!("=== Modifiers for {player} ===").bright_yellow().bold().to_string();
    for (id, value) in totals {
        let _ = write!(out, "\n{:<28} {value:+.3}", id.cyan());
    }
    out
}

fn describe_grant(category: &str, outcome: &GrantOutcome) -> String {
    match outcome {
        GrantOutcome::Gained { current_exp, required } => {
            format!("{category}: {current_exp:.0}/{required:.0} EXP")
        },
        GrantOutcome::LevelUpReady { next_level } => format!(
            "{category}: {} (use 'claim')",
            format!("level {next_level} ready").bright_green()
        ),
        GrantOutcome::Blocked => format!("{category}: experience gain is blocked").yellow().to_string(),
        GrantOutcome::MaxLevel => format!("{category}: already at max level").yellow().to_string(),
        GrantOutcome::UnknownCategory | GrantOutcome::UnknownAction | GrantOutcome::InvalidAmount => {
            "nothing granted".dimmed().to_string()
        },
    }
}

fn describe_claim(category: &str, outcome: &ClaimOutcome) -> String {
    match outcome {
        ClaimOutcome::LeveledUp {
            level,
            points_granted,
            quest_gated,
            ..
        } => {
            let mut text = format!(
                "{category}: {} (+{points_granted} SP)",
                format!("reached level {level}").bright_green()
            );
            if *quest_gated {
                let _ = write!(text, " {}", format!("milestone quest at {level} required").magenta());
            }
            text
        },
        ClaimOutcome::QuestRequired { level } => format!("{category}: complete the level {level} quest first")
            .yellow()
            .to_string(),
        ClaimOutcome::NothingPending => format!("{category}: no level-up pending").dimmed().to_string(),
        ClaimOutcome::MaxLevel => format!("{category}: already at max level").yellow().to_string(),
        ClaimOutcome::UnknownCategory => "nothing claimed".dimmed().to_string(),
    }
}

fn describe_quest(category: &str, level: u32, outcome: QuestOutcome) -> String {
    match outcome {
        QuestOutcome::Completed { gate_open } => {
            let tail = if gate_open { "experience gain resumed" } else { "claim pending level-ups" };
            format!("{category} level {level} quest {} ({tail})", "completed".green())
        },
        QuestOutcome::AlreadyCompleted => format!("{category} level {level} quest already completed")
            .dimmed()
            .to_string(),
        QuestOutcome::RequirementsMissing => format!("{category} level {level} quest requirements not met")
            .yellow()
            .to_string(),
        QuestOutcome::NoQuest => format!("{category} has no quest at level {level}").dimmed().to_string(),
        QuestOutcome::UnknownCategory => "no such category".dimmed().to_string(),
    }
}

pub fn help_text() -> String {
    let lines = [
        ("stats <player>", "show levels, experience and skill points"),
        (USAGE_ADDEXP, "grant experience"),
        (USAGE_SETLEVEL, "force a level"),
        ("resetskills <player> <category>", "refund every skill rank"),
        ("claim <player> <category>", "apply a pending level-up"),
        ("learn <player> <category> <skill>", "spend points on a skill rank"),
        (USAGE_QUEST, "complete a milestone quest"),
        ("modifiers <player>", "list summed modifiers"),
        ("reload", "re-read configuration"),
        ("save", "flush every cached player"),
        ("quit", "save and exit"),
    ];
    let mut out = "=== Ascend Commands ===".bright_yellow().bold().to_string();
    for (usage, what) in lines {
        let _ = write!(out, "\n{:<44} {}", usage.cyan(), what.dimmed());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYER: &str = "6f1c1e8e-6c59-4f43-9d0a-5b1c8f3f2a10";

    #[test]
    fn parses_admin_commands() {
        assert_eq!(
            parse_command("addexp p mining 25.5"),
            Command::AddExp {
                player: "p".into(),
                category: "mining".into(),
                amount: 25.5
            }
        );
        assert_eq!(parse_command("setlevel p mining ten"), Command::Usage(USAGE_SETLEVEL));
        assert!(parse_command("quit").is_quit());
        assert!(parse_command("exit").is_quit());
        assert!(parse_command("dance").is_unknown());
        assert!(parse_command("stats p").is_stats());
    }

    #[test]
    fn bad_player_id_is_reported() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let progression = Progression::open(dir.path());
        let result = try_execute(&progression, &parse_command("stats nobody"));
        assert!(matches!(result, Err(ProgressionError::InvalidPlayer(_))));
        Ok(())
    }

    #[test]
    fn addexp_then_claim() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let progression = Progression::open(dir.path());
        let player = parse_player(PLAYER)?;

        try_execute(&progression, &parse_command(&format!("addexp {PLAYER} mining 150")))?;
        assert_eq!(progression.get_player_level(player, "mining"), 1);
        try_execute(&progression, &parse_command(&format!("claim {PLAYER} mining")))?;
        assert_eq!(progression.get_player_level(player, "mining"), 2);
        assert_eq!(progression.skills().available_points(player, "mining"), 1);

        let result = try_execute(&progression, &parse_command(&format!("learn {PLAYER} mining nope")));
        assert!(matches!(result, Err(ProgressionError::UnknownSkill { .. })));
        Ok(())
    }
}
