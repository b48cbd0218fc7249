mod assertions;
mod database;
mod utils;
