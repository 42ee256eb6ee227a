//! Property-based tests for scoring and shaping guarantees
