use minic_core::{Op, WORD_BYTES, Word};

/// Append-only buffer of emitted instruction words.
///
/// Forward jumps are emitted as a reserved zero slot and patched once
/// the target is known. The emitter also inspects and rewrites the most
/// recently emitted word: that is how a pending load becomes a store
/// (assignment) or disappears (address-of).
#[derive(Clone, Default)]
pub struct CodePool {
    words: Vec<Word>,
}

impl CodePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Position the next emitted word will occupy.
    pub fn here(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn emit(&mut self, word: Word) {
        self.words.push(word);
    }

    pub fn emit_op(&mut self, op: Op) {
        self.words.push(op.as_word());
    }

    /// Reserve one slot for a jump target, returning its position.
    pub fn reserve(&mut self) -> usize {
        let pos = self.words.len();
        self.words.push(0);
        pos
    }

    /// Patch a previously reserved slot.
    pub fn patch(&mut self, pos: usize, word: Word) {
        if pos < self.words.len() {
            self.words[pos] = word;
        }
    }

    pub fn get(&self, pos: usize) -> Option<Word> {
        self.words.get(pos).copied()
    }

    /// The most recently emitted word.
    pub fn last(&self) -> Option<Word> {
        self.words.last().copied()
    }

    /// Rewrite the most recently emitted word in place.
    pub fn rewrite_last(&mut self, word: Word) {
        if let Some(last) = self.words.last_mut() {
            *last = word;
        }
    }

    /// Drop the most recently emitted word.
    pub fn discard_last(&mut self) {
        self.words.pop();
    }

    pub fn finish(self) -> Vec<Word> {
        self.words
    }
}

/// Append-only arena of global storage and string-literal bytes.
///
/// Addresses handed out are final guest addresses: the VM maps the pool
/// at the bottom of guest memory. The first word is reserved so that
/// address zero never names a real object.
#[derive(Clone)]
pub struct DataPool {
    bytes: Vec<u8>,
}

impl DataPool {
    pub fn new() -> Self {
        Self {
            bytes: vec![0; WORD_BYTES as usize],
        }
    }

    /// Address of the next byte to be written.
    pub fn addr(&self) -> Word {
        self.bytes.len() as Word
    }

    pub fn push_byte(&mut self, byte: u8) {
        self.bytes.push(byte);
    }

    /// Terminate a string-literal run with its zero byte and re-align
    /// the pool to a word boundary.
    pub fn terminate_str(&mut self) {
        self.bytes.push(0);
        while self.bytes.len() % WORD_BYTES as usize != 0 {
            self.bytes.push(0);
        }
    }

    /// Allocate one zeroed word of global storage, returning its address.
    pub fn alloc_word(&mut self) -> Word {
        let addr = self.addr();
        self.bytes.extend_from_slice(&[0; WORD_BYTES as usize]);
        addr
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

impl Default for DataPool {
    fn default() -> Self {
        Self::new()
    }
}
