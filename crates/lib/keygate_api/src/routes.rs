//! Fully-qualified RPC method paths.

pub const AUTH_LOGIN: &str = "/api.v1.AuthService/Login";
pub const AUTH_GET_CURRENT_USER: &str = "/api.v1.AuthService/GetCurrentUser";
pub const AUTH_LOGOUT: &str = "/api.v1.AuthService/Logout";

pub const API_KEY_CREATE: &str = "/api.v1.APIKeyService/CreateAPIKey";
pub const API_KEY_LIST: &str = "/api.v1.APIKeyService/ListAPIKeys";
pub const API_KEY_UPDATE: &str = "/api.v1.APIKeyService/UpdateAPIKey";
pub const API_KEY_DELETE: &str = "/api.v1.APIKeyService/DeleteAPIKey";

pub const GREETER_SAY_HELLO: &str = "/api.v1.GreeterService/SayHello";

/// Methods callable without a session token.
pub const PUBLIC_METHODS: [&str; 2] = [AUTH_LOGIN, GREETER_SAY_HELLO];
