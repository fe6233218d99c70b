/// Normalize a movie title and year into the query string scrapers search
/// with and the cache is keyed by.
///
/// Lowercases, drops apostrophes, spells out `&`, collapses every other run
/// of non-alphanumeric characters into one space, then appends the year.
pub fn canonical_movie_query(title: &str, year: &str) -> String {
    let mut cleaned = String::with_capacity(title.len());
    let mut pending_space = false;

    for c in title.chars() {
        match c {
            '\'' | '\u{2019}' => {}
            '&' => {
                cleaned.push_str(if cleaned.is_empty() { "and" } else { " and" });
                pending_space = true;
            }
            c if c.is_alphanumeric() => {
                if pending_space && !cleaned.is_empty() {
                    cleaned.push(' ');
                }
                pending_space = false;
                cleaned.extend(c.to_lowercase());
            }
            _ => pending_space = true,
        }
    }

    let year = year.trim();
    if year.is_empty() {
        cleaned
    } else if cleaned.is_empty() {
        year.to_string()
    } else {
        format!("{} {}", cleaned, year)
    }
}
