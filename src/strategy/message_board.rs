use crate::config::ForumConfig;
use crate::normalize::clean_last_line;
use crate::patterns::ErrorPattern;
use crate::store::ForumLinks;
use crate::theme::Styler;
use crate::trace::trim_error;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::warn;

const FOUND_POST: &str = "It looks like there is a forum post for this error, check it out!";
const SUGGEST_POST: &str =
    "Unfortunately, there is not a forum post for this error, why don't you make one!";

/// A post discussing the error in `stderr`, chosen uniformly among the
/// posts of the first link entry whose pattern matches the error line.
/// An empty first match means no post, even if a later entry has some.
pub fn find_post<'a, R: Rng + ?Sized>(
    stderr: &str,
    links: &'a ForumLinks,
    rng: &mut R,
) -> Option<&'a str> {
    let error = clean_last_line(stderr);

    for (key, entry) in links {
        let pattern = match ErrorPattern::from_document_key(key) {
            Ok(pattern) => pattern,
            Err(e) => {
                warn!(key = %key, "skipping forum link with invalid pattern: {}", e);
                continue;
            }
        };
        if pattern.is_match(error) {
            return entry.post_ids.choose(rng).map(String::as_str);
        }
    }
    None
}

pub fn message_board_error<R: Rng + ?Sized>(
    stderr: &str,
    links: Option<&ForumLinks>,
    forum: &ForumConfig,
    styler: &dyn Styler,
    rng: &mut R,
) -> String {
    let trimmed = trim_error(stderr, styler);

    let suffix = match links.and_then(|links| find_post(stderr, links, rng)) {
        Some(post_id) => format!("\r\n{}\r\n{}", FOUND_POST, forum.post_url(post_id)),
        None => format!("\r\n{}\r\n{}", SUGGEST_POST, forum.forum_url()),
    };
    trimmed + &styler.color(&styler.escape(&suffix))
}
