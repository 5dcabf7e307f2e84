// Standardized error codes attached to every API error body

pub mod validation {
    pub const INVALID_INPUT: &str = "VALIDATION_1001";
    pub const MISSING_REQUIRED_FIELD: &str = "VALIDATION_1002";
    pub const INVALID_FORMAT: &str = "VALIDATION_1003";
}

pub mod authentication {
    pub const INVALID_CREDENTIALS: &str = "AUTH_2001";
    pub const TOKEN_EXPIRED: &str = "AUTH_2002";
    pub const SESSION_INVALID: &str = "AUTH_2003";
    pub const ACCOUNT_DISABLED: &str = "AUTH_2004";
}

pub mod authorization {
    pub const ACCESS_DENIED: &str = "AUTHZ_3001";
    pub const ROLE_NOT_PERMITTED: &str = "AUTHZ_3002";
}

pub mod database {
    pub const CONNECTION_FAILED: &str = "DB_4001";
    pub const QUERY_FAILED: &str = "DB_4002";
    pub const CONSTRAINT_VIOLATION: &str = "DB_4003";
}

pub mod business {
    pub const RULE_VIOLATION: &str = "BIZ_5001";
    pub const RESOURCE_NOT_FOUND: &str = "BIZ_5002";
}

pub mod system {
    pub const INTERNAL: &str = "SYS_9001";
}
