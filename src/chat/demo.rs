//! Static replies for demo mode.

/// Ordered (substring, reply) table. The first key found in the lowercased,
/// trimmed message wins, so "hello" shadows "hi".
pub const DEMO_RESPONSES: &[(&str, &str)] = &[
    ("hello", "Hello! How can I help you today?"),
    ("hi", "Hi there! What can I do for you?"),
    ("how are you", "I'm doing great, thanks for asking! How about you?"),
    (
        "what is ai",
        "AI (Artificial Intelligence) refers to computer systems designed to perform tasks that typically require human intelligence.",
    ),
    (
        "what is python",
        "Python is a popular programming language known for its simplicity and readability.",
    ),
    (
        "help",
        "You can ask me questions about anything! Try asking me about AI, Python, or just say hello.",
    ),
    (
        "thank you",
        "You're welcome! If you have more questions, feel free to ask.",
    ),
];

pub const DEFAULT_RESPONSE: &str = "That's an interesting question! In demo mode, I can provide helpful responses. For more advanced AI features, please configure an OpenAI API key.";

/// Reply for `message` from the demo table.
pub fn demo_response(message: &str) -> &'static str {
    let lowered = message.to_lowercase();
    let lowered = lowered.trim();

    DEMO_RESPONSES
        .iter()
        .find(|(key, _)| lowered.contains(key))
        .map(|(_, reply)| *reply)
        .unwrap_or(DEFAULT_RESPONSE)
}
