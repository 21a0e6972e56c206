use std::io::Write;

use eyre::Result;
use tokio::io::{AsyncBufReadExt, BufReader, stdin};

use crate::{config::Config, misc::StatusDot, panel::ControlPanel, plc::DeviceState};

use super::{common::ConnectOpts, exec::Step};

fn help() -> String {
    format!(
        "\
on | off          switch the motor
speed <n>         set the speed (0-{max})
stop              emergency stop
status            show the connection and device state
login | logout    open or close the session
quit              leave the panel",
        max = DeviceState::MAX_SPEED
    )
}

enum Input {
    Step(Step),
    Status,
    Login,
    Logout,
    Help,
    Quit,
}

/// Line-oriented control panel. A single operator drives a single session,
/// so every command runs to completion before the next line is read.
pub async fn run(mut panel: ControlPanel, connect: ConnectOpts, config: &Config) -> Result<()> {
    if connect.password.is_some() {
        login(&mut panel, &connect, config).await;
    } else {
        println!("No password given, start with --password or SPS_PASSWORD to log in");
    }

    let mut lines = BufReader::new(stdin()).lines();

    loop {
        prompt(&panel)?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let input = match parse(line.trim()) {
            Some(Ok(input)) => input,
            Some(Err(err)) => {
                println!("{err}");
                continue;
            }
            None => continue,
        };

        match input {
            Input::Step(step) => match step.apply(&mut panel).await {
                Ok(_) => println!("{}", panel.status()),
                Err(err) => println!("{err}"),
            },

            Input::Status => println!("{}", panel.status()),
            Input::Login => login(&mut panel, &connect, config).await,
            Input::Logout => panel.logout(),
            Input::Help => println!("{}", help()),
            Input::Quit => break,
        }
    }

    Ok(())
}

async fn login(panel: &mut ControlPanel, connect: &ConnectOpts, config: &Config) {
    match super::common::login(panel, connect.clone(), config).await {
        Ok(()) => println!("Login successful\n{}", panel.status()),
        Err(err) => println!("Login failed: {err}"),
    }
}

fn parse(line: &str) -> Option<Result<Input, String>> {
    let input = match line {
        "" => return None,
        "status" => Input::Status,
        "login" => Input::Login,
        "logout" => Input::Logout,
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        step => return Some(step.parse().map(Input::Step).map_err(|e| e.to_string())),
    };

    Some(Ok(input))
}

fn prompt(panel: &ControlPanel) -> std::io::Result<()> {
    let mut stdout = std::io::stdout().lock();

    match panel.session() {
        Some(session) => write!(stdout, "{} {}> ", StatusDot(panel.state().power), session.address())?,
        None => write!(stdout, "{} offline> ", StatusDot(false))?,
    }

    stdout.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert!(parse("").is_none());
        assert!(matches!(parse("status"), Some(Ok(Input::Status))));
        assert!(matches!(parse("exit"), Some(Ok(Input::Quit))));
        assert!(matches!(
            parse("speed 1200"),
            Some(Ok(Input::Step(Step::Speed(1200))))
        ));
        assert!(matches!(parse("jump"), Some(Err(_))));
    }

    #[test]
    fn test_help_range() {
        assert!(help().contains(&format!("(0-{})", DeviceState::MAX_SPEED)));
    }
}
