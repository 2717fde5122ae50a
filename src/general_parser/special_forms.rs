use super::gast::List;

/// Forms whose operands are not uniformly evaluated as procedure arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialForm {
    // quoting
    Quote,

    // minimal structures
    Define,
    Begin,
    If,
}

impl SpecialForm {
    pub fn from_identifier(identifier: &str) -> Option<Self> {
        match identifier {
            "quote" => Some(Self::Quote),
            "define" => Some(Self::Define),
            "begin" => Some(Self::Begin),
            "if" => Some(Self::If),
            _ => None,
        }
    }

    /// The special form a list invokes, judging by its head
    pub fn of(list: &List) -> Option<Self> {
        Self::from_identifier(&list.head_identifier()?)
    }
}
