use std::io::{BufRead, Write};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info, warn};

use crate::governance::audit::AuditLog;
use crate::governance::proposals::Proposal;
use crate::governance::voting::VotingService;
use crate::governance::workflow::Phase;
use crate::identity::Identity;

/// One command line of a voting session.
#[derive(Parser, Debug)]
#[command(name = "juliusvote", no_binary_name = true, disable_version_flag = true)]
pub struct Cli {
    /// 呼び出し元のID（認証済み）
    #[arg(long = "as", value_name = "ID")]
    caller: Identity,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 参加者の登録 (administrator)
    Register { identity: Identity },

    /// フェーズの変更 (administrator)
    SetPhase { phase: Phase },

    /// 次のフェーズへ進める (administrator)
    Advance,

    /// 提案の登録
    Propose { description: String },

    /// 投票
    Vote { index: usize },

    /// 集計 (administrator)
    Tally,

    /// 提案の一覧表示
    List,

    /// 提案の詳細表示
    Show { index: usize },

    /// 自分の投票状況
    Status,

    /// 登録済み参加者の一覧 (administrator)
    Participants,

    /// 指定した参加者の投票先
    VoteOf { identity: Identity },

    /// 勝者の表示
    Winner,

    /// 集計結果
    Results {
        /// JSONで出力
        #[arg(long)]
        json: bool,
    },

    /// 現在のフェーズ
    #[command(name = "phase")]
    CurrentPhase,

    /// 監査ログの検証
    Audit,
}

pub struct CliHandler {
    service: VotingService,
}

impl CliHandler {
    pub fn new(service: VotingService) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &VotingService {
        &self.service
    }

    /// Runs a command script line by line, writing each command's output.
    ///
    /// Blank lines and `#` comments are skipped. A rejected command is logged
    /// and counted; with `strict` the session stops at the first one.
    /// Returns the number of rejected commands.
    pub fn run_lines(
        &mut self,
        input: impl BufRead,
        mut output: impl Write,
        strict: bool,
    ) -> Result<usize> {
        let mut failures = 0usize;
        for (number, line) in input.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", number + 1))?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match self.handle_line(line) {
                Ok(text) => writeln!(output, "{}", text)?,
                Err(e) => {
                    failures += 1;
                    warn!("line {}: {}", number + 1, e);
                    if strict {
                        error!("Stopping at line {} (strict mode)", number + 1);
                        break;
                    }
                }
            }
        }
        output.flush()?;
        Ok(failures)
    }

    /// Parses and runs one line, returning the text to show the user.
    pub fn handle_line(&mut self, line: &str) -> Result<String> {
        self.handle_command(split_command_line(line)?)
    }

    pub fn handle_command(&mut self, args: Vec<String>) -> Result<String> {
        let cli = Cli::try_parse_from(args)?;
        let caller = cli.caller;
        let service = &mut self.service;

        match cli.command {
            Commands::Register { identity } => {
                service.register_participant(&caller, identity.clone())?;
                Ok(format!("Registered participant {}", identity))
            }

            Commands::SetPhase { phase } => {
                service.set_phase(&caller, phase)?;
                Ok(format!("Phase is now {}", phase))
            }

            Commands::Advance => {
                let phase = service.advance_phase(&caller)?;
                Ok(format!("Phase is now {}", phase))
            }

            Commands::Propose { description } => {
                let index = service.register_proposal(&caller, description)?;
                Ok(format!("Proposal #{} registered", index))
            }

            Commands::Vote { index } => {
                service.cast_vote(&caller, index)?;
                Ok(format!("Vote recorded for proposal #{}", index))
            }

            Commands::Tally => {
                let winner = service.run_tally(&caller)?;
                Ok(format!("Winning proposal: #{}", winner))
            }

            Commands::List => {
                let proposals = service.list_proposals(&caller)?;
                if proposals.is_empty() {
                    return Ok("No proposals registered".to_string());
                }
                Ok(proposals
                    .iter()
                    .enumerate()
                    .map(|(index, proposal)| format_proposal(index, proposal))
                    .collect::<Vec<_>>()
                    .join("\n"))
            }

            Commands::Show { index } => {
                let proposal = service.proposal(&caller, index)?;
                Ok(format_proposal(index, &proposal))
            }

            Commands::Status => {
                let record = service.participant_status(&caller)?;
                Ok(match record.voted_proposal_index {
                    Some(index) => format!("{}: registered, voted for proposal #{}", caller, index),
                    None => format!("{}: registered, not voted yet", caller),
                })
            }

            Commands::Participants => {
                let identities = service.participants(&caller)?;
                Ok(format!(
                    "{} participant(s): {}",
                    identities.len(),
                    identities.iter().map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
                ))
            }

            Commands::VoteOf { identity } => Ok(match service.vote_of(&caller, &identity)? {
                Some(index) => format!("{} voted for proposal #{}", identity, index),
                None => format!("{} did not vote", identity),
            }),

            Commands::Winner => {
                let winner = service.winner(&caller)?;
                Ok(format!("#{}", winner))
            }

            Commands::Results { json } => {
                let report = service.results(&caller)?;
                if json {
                    return Ok(serde_json::to_string_pretty(&report)?);
                }
                let mut lines = vec![format!(
                    "Winner: #{} {}",
                    report.winning_proposal_index,
                    report.winning_description.as_deref().unwrap_or("(no proposals)")
                )];
                for (index, count) in report.vote_counts.iter().enumerate() {
                    lines.push(format!("  #{}: {} vote(s)", index, count));
                }
                lines.push(format!("Total: {} vote(s)", report.total_votes));
                lines.push(format!(
                    "Turnout: {} of {} participant(s)",
                    report.voters, report.participants
                ));
                Ok(lines.join("\n"))
            }

            Commands::CurrentPhase => Ok(service.current_phase().to_string()),

            Commands::Audit => {
                let log = AuditLog::from_events(service.events())?;
                log.verify()?;
                info!("Audit chain verified ({} records)", log.len());
                Ok(match log.head_hex() {
                    Some(head) => format!("{} record(s), head {}", log.len(), head),
                    None => "0 record(s)".to_string(),
                })
            }
        }
    }
}

fn format_proposal(index: usize, proposal: &Proposal) -> String {
    format!("#{} [{} vote(s)] {}", index, proposal.vote_count, proposal.description)
}

/// Splits a line on whitespace; double quotes group words and `\"` escapes
/// a quote inside them.
pub fn split_command_line(line: &str) -> Result<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            '\\' if in_quotes => match chars.next() {
                Some(escaped) => current.push(escaped),
                None => return Err(anyhow!("Dangling escape at end of line")),
            },
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    args.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }

    if in_quotes {
        return Err(anyhow!("Unterminated quote in: {}", line));
    }
    if has_token {
        args.push(current);
    }
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governance::error::VotingError;
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    fn handler() -> CliHandler {
        CliHandler::new(VotingService::new(Identity::new("admin")))
    }

    #[test]
    fn test_split_command_line() {
        assert_eq!(
            split_command_line(r#"--as alice propose "Plant  more trees""#).unwrap(),
            vec!["--as", "alice", "propose", "Plant  more trees"]
        );
        assert_eq!(
            split_command_line(r#"--as a propose "say \"hi\"""#).unwrap(),
            vec!["--as", "a", "propose", "say \"hi\""]
        );
        assert_eq!(split_command_line(r#"x "" y"#).unwrap(), vec!["x", "", "y"]);
        assert!(split_command_line("   ").unwrap().is_empty());
        assert!(split_command_line(r#"--as a propose "open"#).is_err());
    }

    #[test]
    fn test_session_flow() {
        let mut cli = handler();
        let script = [
            ("--as admin register alice", "Registered participant alice"),
            ("--as admin register bob", "Registered participant bob"),
            ("--as admin set-phase proposals-open", "Phase is now ProposalsOpen"),
            ("--as alice propose X", "Proposal #0 registered"),
            (r#"--as bob propose "Y and Z""#, "Proposal #1 registered"),
            ("--as admin set-phase VotingOpen", "Phase is now VotingOpen"),
            ("--as alice vote 1", "Vote recorded for proposal #1"),
            ("--as bob vote 1", "Vote recorded for proposal #1"),
            ("--as alice status", "alice: registered, voted for proposal #1"),
            ("--as admin advance", "Phase is now VotingClosed"),
            ("--as admin tally", "Winning proposal: #1"),
            ("--as admin advance", "Phase is now Tallied"),
            ("--as bob winner", "#1"),
            ("--as bob vote-of alice", "alice voted for proposal #1"),
            ("--as bob list", "#0 [0 vote(s)] X\n#1 [2 vote(s)] Y and Z"),
            ("--as admin participants", "2 participant(s): alice, bob"),
            ("--as nobody phase", "Tallied"),
        ];
        for (line, expected) in script {
            assert_eq!(cli.handle_line(line).unwrap(), expected, "line: {}", line);
        }

        let audit = cli.handle_line("--as admin audit").unwrap();
        assert!(audit.starts_with("11 record(s), head "));
    }

    #[test]
    fn test_rejections_surface_voting_errors() {
        let mut cli = handler();
        let err = cli.handle_line("--as mallory register mallory").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<VotingError>(),
            Some(VotingError::Unauthorized { .. })
        ));

        let err = cli.handle_line("--as admin vote 0").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<VotingError>(),
            Some(VotingError::Unauthorized { .. })
        ));

        assert!(cli.handle_line("--as admin set-phase nowhere").is_err());
        assert!(cli.handle_line("--as admin fly").is_err());
        assert!(cli.handle_line("--as bad!id phase").is_err());
    }

    #[test]
    fn test_results_json() {
        let mut cli = handler();
        for line in [
            "--as admin register alice",
            "--as admin set-phase tallied",
        ] {
            cli.handle_line(line).unwrap();
        }
        let json = cli.handle_line("--as alice results --json").unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["winning_proposal_index"], 0);
        assert_eq!(value["winning_description"], serde_json::Value::Null);
        assert_eq!(value["total_votes"], 0);
        assert_eq!(value["participants"], 1);
        assert_eq!(value["voters"], 0);

        let text = cli.handle_line("--as alice results").unwrap();
        assert!(text.starts_with("Winner: #0 (no proposals)"));
        assert!(text.ends_with("Turnout: 0 of 1 participant(s)"));
    }

    const SCRIPT_WITH_REJECTION: &str = "\
# set up the ballot
--as admin register alice

--as admin register alice
   # indented comment
--as admin set-phase proposals-open
";

    #[test]
    fn test_run_lines_continues_past_rejections() {
        let mut cli = handler();
        let mut output = Vec::new();
        let failures = cli
            .run_lines(Cursor::new(SCRIPT_WITH_REJECTION), &mut output, false)
            .unwrap();

        assert_eq!(failures, 1);
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Registered participant alice\nPhase is now ProposalsOpen\n"
        );
        assert_eq!(cli.service().current_phase(), Phase::ProposalsOpen);
    }

    #[test]
    fn test_run_lines_strict_stops_at_first_rejection() {
        let mut cli = handler();
        let mut output = Vec::new();
        let failures = cli
            .run_lines(Cursor::new(SCRIPT_WITH_REJECTION), &mut output, true)
            .unwrap();

        assert_eq!(failures, 1);
        assert_eq!(String::from_utf8(output).unwrap(), "Registered participant alice\n");
        // the line after the rejection never ran
        assert_eq!(cli.service().current_phase(), Phase::RegisteringParticipants);
    }

    #[test]
    fn test_run_lines_skips_comments_and_blanks() {
        let mut cli = handler();
        let mut output = Vec::new();
        let failures = cli
            .run_lines(Cursor::new("\n# only comments\n   \n\t# more\n"), &mut output, true)
            .unwrap();

        assert_eq!(failures, 0);
        assert!(output.is_empty());
        assert!(cli.service().events().is_empty());
    }

    #[test]
    fn test_run_lines_reports_unreadable_input() {
        let mut cli = handler();
        let invalid_utf8: &[u8] = b"--as admin phase\n\xff\xfe\n";
        let err = cli.run_lines(invalid_utf8, std::io::sink(), false).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
