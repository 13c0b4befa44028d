use rand::seq::SliceRandom;
use rand::thread_rng;

const COMMENTS: &[&str] = &[
    "Debugging is like being a detective in a mystery movie where you're also the murderer.",
    "Why do programmers prefer dark mode? Less bright light when staring at their screen for hours.",
    "Debugging is like trying to find a needle in a haystack, except the needle is also made of hay.",
    "Why do developers always mix up Halloween and Christmas? Because Oct 31 equals Dec 25.",
    "Why was the JavaScript developer sad? They didn't know how to 'null'.",
    "Why do programmers always mix up Thanksgiving and Christmas? Because Nov 25 equals Dec 25.",
];

/// Picks the cosmetic `joke` attached to response bodies.
#[derive(Debug, Clone, Copy)]
pub struct Banter {
    enabled: bool,
}

impl Banter {
    pub fn new(enabled: bool) -> Self {
        Banter { enabled }
    }

    pub fn comment(&self) -> Option<String> {
        if !self.enabled {
            return None;
        }
        COMMENTS
            .choose(&mut thread_rng())
            .map(|comment| (*comment).to_owned())
    }
}
