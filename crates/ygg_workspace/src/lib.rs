// This is a stub lib.rs managed by cargo hakari.
