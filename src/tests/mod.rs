mod entries;
mod grouping;
mod search_and_stats;
mod settings;
mod signup;
