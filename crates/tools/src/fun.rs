//! Jokes, advice, quotes and dice.

use jarvis_core::error::{RegistryError, ToolError};
use jarvis_core::session::Session;
use jarvis_core::tool::{FnTool, ToolArgs, ToolParameter, ToolRegistry};
use rand::Rng;
use rand::seq::IndexedRandom;

const JOKES: &[&str] = &[
    "Why don't scientists trust atoms? Because they make up everything!",
    "Why did the scarecrow win an award? Because he was outstanding in his field!",
    "What do you call a fake noodle? An impasta!",
    "How does a penguin build its house? Igloos it together!",
    "Why did the math book look so sad? Because it had too many problems!",
];

const ADVICE: &[&str] = &[
    "Take breaks when working long hours. Your productivity will thank you.",
    "Drink more water! It's good for your health and concentration.",
    "Don't forget to back up your important files regularly.",
    "A 5-minute walk outside can refresh your mind more than you think.",
    "Learn something new every day, even if it's small.",
];

const QUOTES: &[&str] = &[
    "The only way to do great work is to love what you do. - Steve Jobs",
    "It always seems impossible until it's done. - Nelson Mandela",
    "Don't count the days, make the days count. - Muhammad Ali",
    "Quality is not an act, it is a habit. - Aristotle",
    "The future belongs to those who believe in the beauty of their dreams. - Eleanor Roosevelt",
];

pub fn register(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    let tools = [
        FnTool::new("tell_joke", "Tells a random joke.", vec![], tell_joke),
        FnTool::new("random_advice", "Gives random advice.", vec![], random_advice),
        FnTool::new(
            "motivational_quote",
            "Shares a motivational quote.",
            vec![],
            motivational_quote,
        ),
        FnTool::new(
            "roll_dice",
            "Rolls a dice with the specified number of sides.",
            vec![ToolParameter::integer("sides", "Number of sides").with_default(6)],
            roll_dice,
        ),
    ];
    for tool in tools {
        registry.register(Box::new(tool))?;
    }
    Ok(())
}

fn pick(items: &[&'static str]) -> String {
    items
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or_default()
        .to_string()
}

fn tell_joke(_: &mut Session, _: &ToolArgs) -> Result<String, ToolError> {
    Ok(pick(JOKES))
}

fn random_advice(_: &mut Session, _: &ToolArgs) -> Result<String, ToolError> {
    Ok(pick(ADVICE))
}

fn motivational_quote(_: &mut Session, _: &ToolArgs) -> Result<String, ToolError> {
    Ok(pick(QUOTES))
}

fn roll_dice(_: &mut Session, args: &ToolArgs) -> Result<String, ToolError> {
    let sides = args.integer("sides")?;
    if sides < 1 {
        return Err(ToolError::rejected("A die needs at least 1 side."));
    }
    let result = rand::rng().random_range(1..=sides);
    Ok(format!("You rolled a {result} on a {sides}-sided die!"))
}
