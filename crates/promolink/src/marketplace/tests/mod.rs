mod common;
mod notifications;
mod offers;
