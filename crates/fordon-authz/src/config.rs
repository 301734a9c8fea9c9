//! RBAC configuration.

/// Configuration for the RBAC service.
#[derive(Debug, Clone)]
pub struct RbacConfig {
    /// Name of the system role created at corporation onboarding
    /// (default: "Admin").
    pub system_role_name: String,
    /// Name of the system role for the root tenant
    /// (default: "Super Admin").
    pub root_system_role_name: String,
    /// Description written on provisioned system roles.
    pub system_role_description: String,
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            system_role_name: "Admin".into(),
            root_system_role_name: "Super Admin".into(),
            system_role_description: "Full access to all entitled resources".into(),
        }
    }
}
