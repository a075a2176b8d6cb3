pub mod dto;
pub mod routes;
pub mod server;

#[cfg(test)]
mod tests;
