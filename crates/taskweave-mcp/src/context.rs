use taskweave_core::ContextMessage;

pub const DEFAULT_MAX_MESSAGES: usize = 30;
pub const DEFAULT_MAX_TOKENS: usize = 8_000;

/// Ordered conversation buffer for one agent, bounded by message count and
/// estimated token count.
///
/// The pinned system instruction lives at index 0. Eviction removes the
/// oldest non-system message until both bounds hold, or until only the
/// system instruction and one other message remain.
pub struct ContextBuffer {
    messages: Vec<ContextMessage>,
    max_messages: usize,
    max_tokens: usize,
}

impl ContextBuffer {
    pub fn new(max_messages: usize, max_tokens: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_messages,
            max_tokens,
        }
    }

    /// Pin the system instruction at index 0, replacing any prior one.
    pub fn set_system_instruction(&mut self, text: impl Into<String>) {
        let msg = ContextMessage::system(text);
        match self.messages.first() {
            Some(first) if first.is_system() => self.messages[0] = msg,
            _ => self.messages.insert(0, msg),
        }
        self.enforce_bounds();
    }

    /// Append a message and re-establish the bounds.
    pub fn push(&mut self, message: ContextMessage) {
        self.messages.push(message);
        self.enforce_bounds();
    }

    pub fn messages(&self) -> &[ContextMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Token estimate over the serialized content: ceil(len / 4) per message.
    pub fn estimated_tokens(&self) -> usize {
        self.messages
            .iter()
            .map(|m| m.estimation_text().len().div_ceil(4))
            .sum()
    }

    fn enforce_bounds(&mut self) {
        loop {
            let within = self.messages.len() <= self.max_messages
                && self.estimated_tokens() <= self.max_tokens;
            if within {
                break;
            }

            let non_system: Vec<usize> = self
                .messages
                .iter()
                .enumerate()
                .filter(|(_, m)| !m.is_system())
                .map(|(i, _)| i)
                .collect();

            // Floor: keep the system instruction plus one other message.
            if non_system.len() <= 1 {
                break;
            }

            self.messages.remove(non_system[0]);
        }
    }
}

impl Default for ContextBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGES, DEFAULT_MAX_TOKENS)
    }
}
