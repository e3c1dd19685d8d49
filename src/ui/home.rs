use crate::ui::palette::Palette;
use chrono::{Local, Timelike};

const FEATURES: [(&str, &str); 3] = [
    (
        "Smart Conversations",
        "Powered by Google's Gemini AI for intelligent responses",
    ),
    (
        "Personal Assistant",
        "Get help with information, ideas, and more",
    ),
    ("Advanced AI", "Experience the latest in AI technology"),
];

pub fn greeting_for_hour(hour: u32) -> &'static str {
    if hour < 12 {
        "Good morning"
    } else if hour < 18 {
        "Good afternoon"
    } else {
        "Good evening"
    }
}

pub fn home_lines(palette: &Palette, hour: u32) -> Vec<String> {
    let mut lines = vec![
        palette.heading(greeting_for_hour(hour)),
        palette.secondary("How can I assist you today?"),
        String::new(),
        palette.heading("Features"),
    ];
    for (title, description) in FEATURES {
        lines.push(format!(
            "  {} {}",
            palette.primary("•"),
            palette.text(title)
        ));
        lines.push(format!("    {}", palette.secondary(description)));
    }
    lines.push(String::new());
    lines.push(format!(
        "{} {}",
        palette.primary("→"),
        palette.text("Start chatting with `mindchat chat`")
    ));
    lines.push(palette.secondary("mindchat • Powered by Gemini AI"));
    lines
}

pub fn print_home(palette: &Palette) {
    for line in home_lines(palette, Local::now().hour()) {
        println!("{line}");
    }
}
