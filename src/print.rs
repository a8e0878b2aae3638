//! ## Printing Module
//!
//! This module is only here to make logging in the terminal easier to read.
//! It allows to print in appropriate colors depending on the situation.
//! It also provides a print-format for the state of the fleet at shutdown.
//!
//! Everything is written to stderr, so the event stream on stdout stays clean.
use ansi_term::Colour::{self, Green, Purple, Red, Yellow};
use unicode_width::UnicodeWidthStr;

use crate::config;
use crate::directive::CarId;
use crate::fleet_view::{CarBehaviour, CarSnapshot};

/// Prints a message in a specified color to the terminal.
///
/// If `PRINT_ELSE_ON` is `false`, the message will not be printed.
///
/// ## Parameters
/// - `msg`: The message to print.
/// - `color`: The color to use for the text output.
pub fn color(msg: String, color: Colour) {
    if config::print_enabled(&config::PRINT_ELSE_ON) {
        eprintln!("{}{}", color.paint("[CUSTOM]:  "), color.paint(msg));
    }
}

/// Prints an error message in red to the terminal.
///
/// If `PRINT_ERR_ON` is `false`, the message will not be printed.
///
/// ## Terminal output
/// - "\[ERROR\]:   {}", msg
///
/// ## Example
/// ```
/// use elevatorfleet::print;
///
/// print::err("Something went wrong!".to_string());
/// ```
pub fn err(msg: String) {
    if config::print_enabled(&config::PRINT_ERR_ON) {
        eprintln!("{}{}", Red.paint("[ERROR]:   "), Red.paint(msg));
    }
}

/// Prints a warning message in yellow to the terminal.
///
/// If `PRINT_WARN_ON` is `false`, the message will not be printed.
///
/// ## Terminal output
/// - "\[WARNING\]: {}", msg
pub fn warn(msg: String) {
    if config::print_enabled(&config::PRINT_WARN_ON) {
        eprintln!("{}{}", Yellow.paint("[WARNING]: "), Yellow.paint(msg));
    }
}

/// Prints a success message in green to the terminal.
///
/// If `PRINT_OK_ON` is `false`, the message will not be printed.
///
/// ## Terminal output
/// - "\[OK\]:      {}", msg
pub fn ok(msg: String) {
    if config::print_enabled(&config::PRINT_OK_ON) {
        eprintln!("{}{}", Green.paint("[OK]:      "), Green.paint(msg));
    }
}

/// Prints an informational message in light blue to the terminal.
///
/// If `PRINT_INFO_ON` is `false`, the message will not be printed.
///
/// ## Terminal output
/// - "\[INFO\]:    {}", msg
pub fn info(msg: String) {
    let light_blue = Colour::RGB(102, 178, 255);
    if config::print_enabled(&config::PRINT_INFO_ON) {
        eprintln!("{}{}", light_blue.paint("[INFO]:    "), light_blue.paint(msg));
    }
}

/// Prints a dispatcher trace line in pink.
///
/// Off by default, enabled with `print_else::true`.
///
/// ## Terminal output
/// - "\[DISPATCH\]: {}", msg
pub fn dispatch(msg: String) {
    let pink = Colour::RGB(255, 51, 255);
    if config::print_enabled(&config::PRINT_ELSE_ON) {
        eprintln!("{}{}", pink.paint("[DISPATCH]: "), pink.paint(msg));
    }
}

/// Prints a car trace line in orange, tagged with the car id.
///
/// Off by default, enabled with `print_else::true`.
///
/// ## Terminal output
/// - "\[CAR 3\]:   {}", msg
pub fn car(id: CarId, msg: String) {
    let orange = Colour::RGB(204, 102, 0);
    if config::print_enabled(&config::PRINT_ELSE_ON) {
        eprintln!("{}{}", orange.paint(format!("[CAR {}]:   ", id)), orange.paint(msg));
    }
}

/// Prints an error for a state that the invariants should make impossible.
///
/// Starts with a red "[ERROR]:" label and follows with the message in a rainbow pattern.
/// Used where a broken invariant is detected and worked around instead of panicking.
pub fn cosmic_err(fun: String) {
    if !config::print_enabled(&config::PRINT_ERR_ON) {
        return;
    }
    let colors = [
        Colour::Red,
        Colour::Yellow,
        Colour::Green,
        Colour::Cyan,
        Colour::Blue,
        Colour::Purple,
    ];

    let message = format!("Invariant broken! IN: {}", fun);
    let mut line = Colour::Red.paint("[ERROR]: ").to_string();
    for (i, c) in message.chars().enumerate() {
        let color = colors[i % colors.len()];
        line.push_str(&color.paint(c.to_string()).to_string());
    }
    eprintln!("{}", line);
}

/// Pads the input text to a fixed display width using spaces.
///
/// Accounts for characters that may take more than one column width,
/// ensuring aligned text in terminal-based tables.
fn pad_text(text: &str, width: usize) -> String {
    let visible_width = UnicodeWidthStr::width(text);
    let padding = width.saturating_sub(visible_width);
    format!("{}{}", text, " ".repeat(padding))
}

/// Logs the state of every car in a structured and colorized table.
///
/// Shows id, floor, reachable range, behaviour, onboard and backlog counts,
/// and split role. Exits early if `config::PRINT_TABLE_ON` is false.
pub fn fleet_table(cars: &[CarSnapshot]) {
    if !config::print_enabled(&config::PRINT_TABLE_ON) {
        return;
    }
    let border = "+------+--------+--------------+------------+---------+---------+--------------+";
    eprintln!("{}", Purple.bold().paint("+------------------------------+"));
    eprintln!("{}", Purple.bold().paint("|       FLEET STATUS           |"));
    eprintln!("{}", Purple.bold().paint("+------------------------------+"));
    eprintln!("{}", border);
    eprintln!(
        "| {} | {} | {} | {} | {} | {} | {} |",
        pad_text("ID", 4),
        pad_text("Floor", 6),
        pad_text("Range", 12),
        pad_text("State", 10),
        pad_text("Onboard", 7),
        pad_text("Backlog", 7),
        pad_text("Split", 12),
    );
    eprintln!("{}", border);

    for car in cars {
        let state = pad_text(car.behaviour.as_str(), 10);
        let state = match car.behaviour {
            CarBehaviour::Wait => Green.paint(state),
            CarBehaviour::Move | CarBehaviour::Reverse => Yellow.paint(state),
            CarBehaviour::DoorOpen => Purple.paint(state),
            CarBehaviour::Reconfigure => Red.paint(state),
        };
        let split = match car.split_role {
            Some(role) => role.as_str().to_string(),
            None => "-".to_string(),
        };
        eprintln!(
            "| {} | {} | {} | {} | {} | {} | {} |",
            pad_text(&car.id.to_string(), 4),
            pad_text(&car.floor.to_string(), 6),
            pad_text(&car.range.to_string(), 12),
            state,
            pad_text(&car.onboard.to_string(), 7),
            pad_text(&car.backlog.to_string(), 7),
            pad_text(&split, 12),
        );
    }
    eprintln!("{}", border);
}
