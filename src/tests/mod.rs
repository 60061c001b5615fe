#[cfg(test)]
pub mod common;

#[cfg(test)]
mod http_surface;
