//! Route path constants, relative to the `/api` mount point

pub mod health {
    pub const HEALTH: &str = "/health";
}

pub mod auth {
    pub const REGISTER: &str = "/auth/register";
    pub const LOGIN: &str = "/auth/login";
    pub const LOGOUT: &str = "/auth/logout";
    pub const VERIFY: &str = "/auth/verify";
}

pub mod users {
    pub const USERS: &str = "/users";
    pub const ME: &str = "/users/me";
    pub const ME_PASSWORD: &str = "/users/me/password";
    pub const DOCTORS: &str = "/users/doctors";
    pub const USER_BY_ID: &str = "/users/:id";
    pub const USER_STATUS: &str = "/users/:id/status";
}

pub mod hospitals {
    pub const HOSPITALS: &str = "/hospitals";
    pub const HOSPITAL_BY_ID: &str = "/hospitals/:id";
}

pub mod appointments {
    pub const APPOINTMENTS: &str = "/appointments";
    pub const APPOINTMENT_BY_ID: &str = "/appointments/:id";
    pub const CANCEL: &str = "/appointments/:id/cancel";
}

pub mod payments {
    pub const PAYMENTS: &str = "/payments";
    pub const PAYMENT_BY_ID: &str = "/payments/:id";
    pub const RECEIPT: &str = "/payments/:id/receipt";
    pub const REFUND: &str = "/payments/:id/refund";
}

pub mod records {
    pub const RECORDS: &str = "/medical-records";
    pub const RECORD_BY_ID: &str = "/medical-records/:id";
    pub const NOTES: &str = "/medical-records/:id/notes";
    pub const ATTACHMENTS: &str = "/medical-records/:id/attachments";
}
