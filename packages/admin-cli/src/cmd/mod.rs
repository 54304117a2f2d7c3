pub mod check_custom;
pub mod delete_league;
pub mod options;
