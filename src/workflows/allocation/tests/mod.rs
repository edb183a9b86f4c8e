mod common;

mod routing;
mod staffing;
