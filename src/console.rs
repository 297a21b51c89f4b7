//! Debug console output, printed only when `debug` is enabled.

#[cfg(not(windows))]
use colorful::{Color, Colorful};

const TAG: &str = "[GATE]";

/// Prints a `[GATE]` status line.
pub(crate) fn status(enabled: bool, message: &str) {
    if !enabled {
        return;
    }

    #[cfg(windows)]
    println!("{} {}", TAG, message);

    #[cfg(not(windows))]
    println!(
        "{} {}",
        TAG.gradient_with_color(Color::Cyan, Color::SpringGreen4),
        message.gradient_with_color(Color::SpringGreen4, Color::Cyan)
    );
}

/// Prints a `[GATE]` line pointing the viewer at a portal route.
pub(crate) fn redirect(enabled: bool, message: &str, target: &str) {
    if !enabled {
        return;
    }

    #[cfg(windows)]
    println!("{} {} Redirecting to {}.", TAG, message, target);

    #[cfg(not(windows))]
    println!(
        "{} Redirecting to {}.",
        format!("{} {}", TAG, message).gradient_with_color(Color::Cyan, Color::SpringGreen4),
        target.color(Color::Blue)
    );
}
