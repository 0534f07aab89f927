use sea_orm::sea_query::{Expr, LikeExpr, SimpleExpr};
use sea_orm::ColumnTrait;

const LIKE_ESCAPE: char = '\\';

/// Unicode lowercase copy of searchable text.
///
/// SQLite's `lower()` only folds ASCII, so searchable columns keep a folded
/// twin written on every save and update.
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Case-insensitive substring match on a column holding [`fold_case`] output.
///
/// The needle is matched literally: `%` and `_` in user input are escaped.
pub fn contains_ignore_case<C: ColumnTrait>(folded_column: C, needle: &str) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like(&fold_case(needle)));
    Expr::col(folded_column).like(LikeExpr::new(pattern).escape(LIKE_ESCAPE))
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch == '%' || ch == '_' || ch == LIKE_ESCAPE {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(ch);
    }
    escaped
}
