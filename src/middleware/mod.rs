/*!
API server middleware.
*/

pub mod request_trace;
