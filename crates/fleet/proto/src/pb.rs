pub mod fleet {
    pub mod agent {
        pub mod v1 {
            include!("generated/fleet.agent.v1.rs");
        }
    }
}
