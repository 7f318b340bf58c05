/// Short-lived token rows (`expireAt` TTL index); nothing in this service writes them.
pub const TOKENS_COLLECTION: &str = "tokens";
