/// A machine word: the unit of the code pool, the VM stack, and every
/// non-`char` value the guest program manipulates.
pub type Word = i64;

/// Size of a machine word in bytes.
///
/// `sizeof(int)` and `sizeof(T *)` in the guest language both equal this;
/// only `char` is smaller.
pub const WORD_BYTES: Word = 8;
