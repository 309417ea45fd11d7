//! Search terms accepted by the books API.
//!
//! The backend serves a fixed set of cached results; any query outside these
//! terms (or their prefixes) yields no books.

pub const SEARCH_TERMS: &[&str] = &[
    "Android", "Art", "Artificial Intelligence", "Astronomy", "Austen", "Baseball", "Basketball",
    "Bhagat", "Biography", "Brief", "Business", "Camus", "Cervantes", "Christie", "Classics",
    "Comics", "Cook", "Cricket", "Cycling", "Desai", "Design", "Development", "Digital Marketing",
    "Drama", "Drawing", "Dumas", "Education", "Everything", "Fantasy", "Film", "Finance", "First",
    "Fitness", "Football", "Future", "Games", "Gandhi", "Homer", "Horror", "Hugo", "Ibsen",
    "Journey", "Kafka", "King", "Lahiri", "Larsson", "Learn", "Literary Fiction", "Make", "Manage",
    "Marquez", "Money", "Mystery", "Negotiate", "Painting", "Philosophy", "Photography", "Poetry",
    "Production", "Programming", "React", "Redux", "River", "Robotics", "Rowling", "Satire",
    "Science Fiction", "Shakespeare", "Singh", "Swimming", "Tale", "Thrun", "Time", "Tolstoy",
    "Travel", "Ultimate", "Virtual Reality", "Web Development", "iOS",
];

/// Terms that start with `prefix`, ignoring case
pub fn suggest(prefix: &str) -> Vec<&'static str> {
    let prefix = prefix.trim().to_lowercase();
    SEARCH_TERMS
        .iter()
        .copied()
        .filter(|term| term.to_lowercase().starts_with(&prefix))
        .collect()
}
