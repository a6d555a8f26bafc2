mod assistant;

pub use assistant::{CareerAdvisor, SuggestionService, CANNED_RESPONSES};
