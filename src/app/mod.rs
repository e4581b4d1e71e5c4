// Presentation layer: turns parsed commands into service calls and rendered text.

pub mod commands;
