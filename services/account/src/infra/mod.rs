pub mod cache;
pub mod db;
pub mod hasher;
pub mod outbox;
pub mod rate_limit;
pub mod token;
pub mod totp;

use crate::usecase::AccountPorts;

/// Production wiring: PostgreSQL, Redis, Argon2id and JWT.
pub struct LivePorts;

impl AccountPorts for LivePorts {
    type Users = db::DbUserRepository;
    type Codes = cache::RedisCodeStore;
    type Limiter = rate_limit::RedisRateLimiter;
    type Hasher = hasher::Argon2Hasher;
    type Tokens = token::JwtTokenIssuer;
}
