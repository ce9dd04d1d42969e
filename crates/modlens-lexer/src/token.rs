//! Token types for JavaScript/TypeScript.
//!
//! Tokens carry no decoded values: callers slice the source with the span.

use crate::span::Span;

/// A token with its kind and source location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// Create a new token.
    #[inline]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// The kind of token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier, including contextual words like `let`, `async`, `type`.
    Identifier,
    /// Reserved word. Reserved words used as property names are identifiers.
    Keyword(Keyword),
    /// Private class member: `#field`
    PrivateName,
    /// String literal: `"hello"`, `'world'`
    String,
    /// Numeric or BigInt literal
    Number,
    /// Regular expression literal: `/pattern/flags`
    Regex,
    /// Template literal without substitutions
    NoSubstitutionTemplate,
    /// Template head: `` `hello ${``
    TemplateHead,
    /// Template middle: `` } middle ${``
    TemplateMiddle,
    /// Template tail: `` } end` ``
    TemplateTail,
    /// Operator or punctuation
    Punct(Punct),
    /// A character no JavaScript token starts with (`@` decorators, stray `#`).
    Unknown,
    /// End of input
    Eof,
}

impl TokenKind {
    /// Whether a `/` following this token starts a regular expression.
    #[must_use]
    pub const fn allows_regex_after(&self) -> bool {
        match self {
            Self::Identifier
            | Self::PrivateName
            | Self::String
            | Self::Number
            | Self::Regex
            | Self::NoSubstitutionTemplate
            | Self::TemplateTail
            | Self::Eof => false,
            Self::TemplateHead | Self::TemplateMiddle | Self::Unknown => true,
            Self::Keyword(keyword) => !keyword.is_value(),
            Self::Punct(punct) => !matches!(
                punct,
                Punct::RParen
                    | Punct::RBracket
                    | Punct::RBrace
                    | Punct::Dot
                    | Punct::QuestionDot
                    | Punct::PlusPlus
                    | Punct::MinusMinus
            ),
        }
    }
}

/// Reserved words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Await,
    Break,
    Case,
    Catch,
    Class,
    Const,
    Continue,
    Debugger,
    Default,
    Delete,
    Do,
    Else,
    Enum,
    Export,
    Extends,
    False,
    Finally,
    For,
    Function,
    If,
    Import,
    In,
    Instanceof,
    New,
    Null,
    Return,
    Super,
    Switch,
    This,
    Throw,
    True,
    Try,
    Typeof,
    Var,
    Void,
    While,
    With,
    Yield,
}

impl Keyword {
    /// Look up a reserved word.
    #[must_use]
    pub fn lookup(word: &str) -> Option<Self> {
        let keyword = match word {
            "await" => Self::Await,
            "break" => Self::Break,
            "case" => Self::Case,
            "catch" => Self::Catch,
            "class" => Self::Class,
            "const" => Self::Const,
            "continue" => Self::Continue,
            "debugger" => Self::Debugger,
            "default" => Self::Default,
            "delete" => Self::Delete,
            "do" => Self::Do,
            "else" => Self::Else,
            "enum" => Self::Enum,
            "export" => Self::Export,
            "extends" => Self::Extends,
            "false" => Self::False,
            "finally" => Self::Finally,
            "for" => Self::For,
            "function" => Self::Function,
            "if" => Self::If,
            "import" => Self::Import,
            "in" => Self::In,
            "instanceof" => Self::Instanceof,
            "new" => Self::New,
            "null" => Self::Null,
            "return" => Self::Return,
            "super" => Self::Super,
            "switch" => Self::Switch,
            "this" => Self::This,
            "throw" => Self::Throw,
            "true" => Self::True,
            "try" => Self::Try,
            "typeof" => Self::Typeof,
            "var" => Self::Var,
            "void" => Self::Void,
            "while" => Self::While,
            "with" => Self::With,
            "yield" => Self::Yield,
            _ => return None,
        };
        Some(keyword)
    }

    /// Keywords that are complete expressions on their own.
    #[must_use]
    pub const fn is_value(&self) -> bool {
        matches!(
            self,
            Self::This | Self::Super | Self::Null | Self::True | Self::False
        )
    }
}

/// Operators and punctuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Punct {
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semicolon,
    Comma,
    Colon,
    Tilde,
    At,
    Dot,
    Ellipsis,
    Question,
    QuestionDot,
    QuestionQuestion,
    QuestionQuestionEq,
    Arrow,
    Eq,
    EqEq,
    EqEqEq,
    Bang,
    BangEq,
    BangEqEq,
    Lt,
    LtEq,
    Shl,
    ShlEq,
    Gt,
    GtEq,
    Shr,
    ShrEq,
    UShr,
    UShrEq,
    Plus,
    PlusPlus,
    PlusEq,
    Minus,
    MinusMinus,
    MinusEq,
    Star,
    StarEq,
    StarStar,
    StarStarEq,
    Slash,
    SlashEq,
    Percent,
    PercentEq,
    Amp,
    AmpAmp,
    AmpEq,
    AmpAmpEq,
    Pipe,
    PipePipe,
    PipeEq,
    PipePipeEq,
    Caret,
    CaretEq,
}

/// Punctuators ordered so that the first prefix match is the longest one.
pub(crate) const PUNCTUATORS: &[(&str, Punct)] = &[
    (">>>=", Punct::UShrEq),
    ("...", Punct::Ellipsis),
    ("===", Punct::EqEqEq),
    ("!==", Punct::BangEqEq),
    ("**=", Punct::StarStarEq),
    ("<<=", Punct::ShlEq),
    (">>=", Punct::ShrEq),
    (">>>", Punct::UShr),
    ("&&=", Punct::AmpAmpEq),
    ("||=", Punct::PipePipeEq),
    ("??=", Punct::QuestionQuestionEq),
    ("=>", Punct::Arrow),
    ("==", Punct::EqEq),
    ("!=", Punct::BangEq),
    ("<=", Punct::LtEq),
    (">=", Punct::GtEq),
    ("<<", Punct::Shl),
    (">>", Punct::Shr),
    ("**", Punct::StarStar),
    ("++", Punct::PlusPlus),
    ("--", Punct::MinusMinus),
    ("+=", Punct::PlusEq),
    ("-=", Punct::MinusEq),
    ("*=", Punct::StarEq),
    ("/=", Punct::SlashEq),
    ("%=", Punct::PercentEq),
    ("&=", Punct::AmpEq),
    ("|=", Punct::PipeEq),
    ("^=", Punct::CaretEq),
    ("&&", Punct::AmpAmp),
    ("||", Punct::PipePipe),
    ("??", Punct::QuestionQuestion),
    ("?.", Punct::QuestionDot),
    ("(", Punct::LParen),
    (")", Punct::RParen),
    ("[", Punct::LBracket),
    ("]", Punct::RBracket),
    (";", Punct::Semicolon),
    (",", Punct::Comma),
    (":", Punct::Colon),
    ("~", Punct::Tilde),
    ("@", Punct::At),
    (".", Punct::Dot),
    ("?", Punct::Question),
    ("=", Punct::Eq),
    ("!", Punct::Bang),
    ("<", Punct::Lt),
    (">", Punct::Gt),
    ("+", Punct::Plus),
    ("-", Punct::Minus),
    ("*", Punct::Star),
    ("/", Punct::Slash),
    ("%", Punct::Percent),
    ("&", Punct::Amp),
    ("|", Punct::Pipe),
    ("^", Punct::Caret),
];
