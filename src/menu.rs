use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::commands::{self, Report};
use crate::config::{Config, DbSettings};

const MENU: &str = "\nChoose an action:
1. Create the database and load employers and vacancies
2. Companies and their vacancy counts
3. All vacancies
4. Average salary
5. Vacancies paid above average
6. Search vacancies by keywords
7. Exit
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Rebuild,
    Companies,
    Vacancies,
    AvgSalary,
    AboveAverage,
    Search,
    Exit,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(MenuChoice::Rebuild),
            "2" => Some(MenuChoice::Companies),
            "3" => Some(MenuChoice::Vacancies),
            "4" => Some(MenuChoice::AvgSalary),
            "5" => Some(MenuChoice::AboveAverage),
            "6" => Some(MenuChoice::Search),
            "7" => Some(MenuChoice::Exit),
            _ => None,
        }
    }
}

/// Split comma separated keywords, dropping blanks.
pub fn parse_keywords(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(String::from)
        .collect()
}

/// Run the menu on stdin/stdout until the user exits or input ends.
pub async fn run(config: &Config, settings: &DbSettings) -> anyhow::Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    run_with(stdin, stdout, config, settings).await
}

pub async fn run_with<R, W>(
    input: R,
    mut output: W,
    config: &Config,
    settings: &DbSettings,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    tracing::info!("Menu started");
    output
        .write_all(format!("Welcome to the vacancy database!\n{}\n", "=".repeat(50)).as_bytes())
        .await?;

    loop {
        output.write_all(MENU.as_bytes()).await?;
        output.write_all(b"\nEnter an action number (1-7): ").await?;
        output.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let Some(choice) = MenuChoice::parse(&line) else {
            output
                .write_all(b"Invalid input. Enter a number from 1 to 7\n")
                .await?;
            continue;
        };

        let report = match choice {
            MenuChoice::Exit => {
                output.write_all(b"Exiting...\n").await?;
                break;
            }
            MenuChoice::Rebuild => {
                let text = match commands::rebuild(config, settings).await {
                    Ok(summary) => {
                        tracing::info!("Database rebuilt");
                        format!(
                            "Saved {} employers and {} vacancies\n",
                            summary.employers, summary.vacancies
                        )
                    }
                    Err(e) => {
                        tracing::error!("Rebuild failed: {e}");
                        format!("Rebuild failed, nothing was saved: {e}\n")
                    }
                };
                output.write_all(text.as_bytes()).await?;
                continue;
            }
            MenuChoice::Companies => Report::Companies,
            MenuChoice::Vacancies => Report::Vacancies,
            MenuChoice::AvgSalary => Report::AvgSalary,
            MenuChoice::AboveAverage => Report::AboveAverage,
            MenuChoice::Search => {
                output
                    .write_all(b"Enter keywords, comma separated (e.g. python, courier): ")
                    .await?;
                output.flush().await?;
                let Some(line) = lines.next_line().await? else {
                    break;
                };
                Report::Search(parse_keywords(&line))
            }
        };

        let text = match commands::report(config, settings, &report).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Report {report:?} failed: {e}");
                format!("{}\n", commands::describe_report_error(&e))
            }
        };
        output
            .write_all(format!("\n{}\n{text}", "=".repeat(30)).as_bytes())
            .await?;
    }

    output.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn parses_choices() {
        assert_eq!(MenuChoice::parse(" 1 "), Some(MenuChoice::Rebuild));
        assert_eq!(MenuChoice::parse("6"), Some(MenuChoice::Search));
        assert_eq!(MenuChoice::parse("7"), Some(MenuChoice::Exit));
        assert_eq!(MenuChoice::parse("8"), None);
        assert_eq!(MenuChoice::parse("one"), None);
        assert_eq!(MenuChoice::parse(""), None);
    }

    #[test]
    fn parses_keywords() {
        assert_eq!(
            parse_keywords(" python, программист ,,  "),
            vec!["python", "программист"]
        );
        assert!(parse_keywords(" , ").is_empty());
    }

    fn settings() -> DbSettings {
        DbSettings {
            host: "localhost".into(),
            port: 5432,
            user: "postgres".into(),
            password: None,
        }
    }

    #[tokio::test]
    async fn invalid_input_then_exit() {
        let config = Config::parse_from(["vacancy-ingest"]);
        let input: &[u8] = b"9\nhello\n7\n";
        let mut output = Vec::new();

        run_with(input, &mut output, &config, &settings()).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        assert_eq!(text.matches("Invalid input").count(), 2);
        assert!(text.ends_with("Exiting...\n"));
    }

    #[tokio::test]
    async fn end_of_input_stops_the_menu() {
        let config = Config::parse_from(["vacancy-ingest"]);
        let input: &[u8] = b"";
        let mut output = Vec::new();

        run_with(input, &mut output, &config, &settings()).await.unwrap();

        assert!(String::from_utf8(output).unwrap().contains("1. Create the database"));
    }
}
