//! Budget-constrained context assembly

/// One attributed piece of corpus text, ready for packing
#[derive(Debug, Clone)]
pub struct ContextPiece {
    /// Base name of the originating file
    pub source: String,
    /// Piece text
    pub text: String,
}

/// Separator between packed pieces. Its length counts against the budget
/// for every piece after the first.
const SEPARATOR: &str = "\n---\n";

/// Pack pieces into one attributed context string.
///
/// Each piece is rendered as `Source: <name>\n<text>`. Pieces are taken
/// greedily in the given order; the first piece that would push the total
/// past `budget` ends the assembly, even if a later piece would still fit.
/// Pieces with empty text are skipped without consuming budget.
pub fn pack(pieces: &[ContextPiece], budget: usize) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut total = 0usize;

    for piece in pieces {
        if piece.text.is_empty() {
            continue;
        }
        let rendered = format!("Source: {}\n{}", piece.source, piece.text);
        let extra = if parts.is_empty() { 0 } else { SEPARATOR.len() };
        if total + rendered.len() + extra > budget {
            break;
        }
        total += rendered.len() + extra;
        parts.push(rendered);
    }

    parts.join(SEPARATOR)
}
