//! Integration tests for the WebSocket frame parser
