// @generated
// Generated from: proto/fleet/agent/v1/agent.proto
// Manual check-in for offline builds.

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ClusterInfo {
    #[prost(string, tag = "1")]
    pub kubernetes_version: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub platform: ::prost::alloc::string::String,
    #[prost(int32, tag = "3")]
    pub node_count: i32,
    #[prost(string, tag = "4")]
    pub region: ::prost::alloc::string::String,
    #[prost(map = "string, string", tag = "5")]
    pub labels:
        ::std::collections::HashMap<::prost::alloc::string::String, ::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ClusterStatus {
    #[prost(string, tag = "1")]
    pub status: ::prost::alloc::string::String,
    #[prost(int32, tag = "2")]
    pub ready_nodes: i32,
    #[prost(int32, tag = "3")]
    pub total_nodes: i32,
    #[prost(string, repeated, tag = "4")]
    pub issues: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(int64, tag = "5")]
    pub last_check: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RegisterRequest {
    #[prost(string, tag = "1")]
    pub cluster_name: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub agent_version: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "3")]
    pub cluster_info: ::core::option::Option<ClusterInfo>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RegisterResponse {
    #[prost(string, tag = "1")]
    pub cluster_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub session_token: ::prost::alloc::string::String,
    #[prost(int32, tag = "3")]
    pub heartbeat_interval_seconds: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HeartbeatRequest {
    #[prost(string, tag = "1")]
    pub cluster_id: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "2")]
    pub status: ::core::option::Option<ClusterStatus>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HeartbeatResponse {
    #[prost(bool, tag = "1")]
    pub acknowledged: bool,
    #[prost(int64, tag = "2")]
    pub server_time: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StreamOperationsRequest {
    #[prost(string, tag = "1")]
    pub cluster_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub session_token: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Operation {
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub cluster_id: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub r#type: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub payload: ::prost::alloc::string::String,
    #[prost(int64, tag = "5")]
    pub created_at: i64,
    #[prost(int32, tag = "6")]
    pub timeout_seconds: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReportResultRequest {
    #[prost(string, tag = "1")]
    pub operation_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub cluster_id: ::prost::alloc::string::String,
    #[prost(bool, tag = "3")]
    pub success: bool,
    #[prost(string, tag = "4")]
    pub message: ::prost::alloc::string::String,
    #[prost(string, tag = "5")]
    pub result: ::prost::alloc::string::String,
    #[prost(int64, tag = "6")]
    pub completed_at: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ReportResultResponse {
    #[prost(bool, tag = "1")]
    pub acknowledged: bool,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CancelOperationRequest {
    #[prost(string, tag = "1")]
    pub operation_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub cluster_id: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub reason: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CancelOperationResponse {
    #[prost(bool, tag = "1")]
    pub cancelled: bool,
    #[prost(string, tag = "2")]
    pub message: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LogEntry {
    #[prost(string, tag = "1")]
    pub cluster_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub operation_id: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub level: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub message: ::prost::alloc::string::String,
    #[prost(int64, tag = "5")]
    pub timestamp: i64,
    #[prost(map = "string, string", tag = "6")]
    pub fields:
        ::std::collections::HashMap<::prost::alloc::string::String, ::prost::alloc::string::String>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StreamLogsResponse {
    #[prost(uint64, tag = "1")]
    pub accepted: u64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MetricSample {
    #[prost(string, tag = "1")]
    pub cluster_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub name: ::prost::alloc::string::String,
    #[prost(double, tag = "3")]
    pub value: f64,
    #[prost(map = "string, string", tag = "4")]
    pub labels:
        ::std::collections::HashMap<::prost::alloc::string::String, ::prost::alloc::string::String>,
    #[prost(int64, tag = "5")]
    pub timestamp: i64,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct StreamMetricsResponse {
    #[prost(uint64, tag = "1")]
    pub accepted: u64,
}

pub mod agent_service_client {
    #![allow(clippy::derive_partial_eq_without_eq)]
    use tonic::codegen::*;

    #[derive(Debug, Clone)]
    pub struct AgentServiceClient<T> {
        inner: tonic::client::Grpc<T>,
    }

    impl AgentServiceClient<tonic::transport::Channel> {
        pub async fn connect<D>(dst: D) -> Result<Self, tonic::transport::Error>
        where
            D: TryInto<tonic::transport::Endpoint>,
            D::Error: Into<StdError>,
        {
            let conn = tonic::transport::Endpoint::new(dst)?.connect().await?;
            Ok(Self::new(conn))
        }
    }

    impl<T> AgentServiceClient<T>
    where
        T: tonic::client::GrpcService<tonic::body::BoxBody>,
        T::Error: Into<StdError>,
        T::ResponseBody: Body<Data = Bytes> + Send + 'static,
        <T::ResponseBody as Body>::Error: Into<StdError> + Send,
    {
        pub fn new(inner: T) -> Self {
            let inner = tonic::client::Grpc::new(inner);
            Self { inner }
        }

        pub async fn register(
            &mut self,
            request: impl tonic::IntoRequest<super::RegisterRequest>,
        ) -> Result<tonic::Response<super::RegisterResponse>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = tonic::codegen::http::uri::PathAndQuery::from_static(
                "/fleet.agent.v1.AgentService/Register",
            );
            self.inner.unary(request.into_request(), path, codec).await
        }

        pub async fn heartbeat(
            &mut self,
            request: impl tonic::IntoRequest<super::HeartbeatRequest>,
        ) -> Result<tonic::Response<super::HeartbeatResponse>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = tonic::codegen::http::uri::PathAndQuery::from_static(
                "/fleet.agent.v1.AgentService/Heartbeat",
            );
            self.inner.unary(request.into_request(), path, codec).await
        }

        pub async fn stream_operations(
            &mut self,
            request: impl tonic::IntoRequest<super::StreamOperationsRequest>,
        ) -> Result<tonic::Response<tonic::codec::Streaming<super::Operation>>, tonic::Status>
        {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = tonic::codegen::http::uri::PathAndQuery::from_static(
                "/fleet.agent.v1.AgentService/StreamOperations",
            );
            self.inner
                .server_streaming(request.into_request(), path, codec)
                .await
        }

        pub async fn report_result(
            &mut self,
            request: impl tonic::IntoRequest<super::ReportResultRequest>,
        ) -> Result<tonic::Response<super::ReportResultResponse>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = tonic::codegen::http::uri::PathAndQuery::from_static(
                "/fleet.agent.v1.AgentService/ReportResult",
            );
            self.inner.unary(request.into_request(), path, codec).await
        }

        pub async fn cancel_operation(
            &mut self,
            request: impl tonic::IntoRequest<super::CancelOperationRequest>,
        ) -> Result<tonic::Response<super::CancelOperationResponse>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = tonic::codegen::http::uri::PathAndQuery::from_static(
                "/fleet.agent.v1.AgentService/CancelOperation",
            );
            self.inner.unary(request.into_request(), path, codec).await
        }

        pub async fn stream_logs(
            &mut self,
            request: impl tonic::IntoStreamingRequest<Message = super::LogEntry>,
        ) -> Result<tonic::Response<super::StreamLogsResponse>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = tonic::codegen::http::uri::PathAndQuery::from_static(
                "/fleet.agent.v1.AgentService/StreamLogs",
            );
            self.inner
                .client_streaming(request.into_streaming_request(), path, codec)
                .await
        }

        pub async fn stream_metrics(
            &mut self,
            request: impl tonic::IntoStreamingRequest<Message = super::MetricSample>,
        ) -> Result<tonic::Response<super::StreamMetricsResponse>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::new(
                    tonic::Code::Unknown,
                    format!("Service was not ready: {}", e.into()),
                )
            })?;
            let codec = tonic::codec::ProstCodec::default();
            let path = tonic::codegen::http::uri::PathAndQuery::from_static(
                "/fleet.agent.v1.AgentService/StreamMetrics",
            );
            self.inner
                .client_streaming(request.into_streaming_request(), path, codec)
                .await
        }
    }
}

pub mod agent_service_server {
    #![allow(clippy::derive_partial_eq_without_eq)]
    use tonic::codegen::*;

    #[tonic::async_trait]
    pub trait AgentService: Send + Sync + 'static {
        async fn register(
            &self,
            request: tonic::Request<super::RegisterRequest>,
        ) -> Result<tonic::Response<super::RegisterResponse>, tonic::Status>;
        async fn heartbeat(
            &self,
            request: tonic::Request<super::HeartbeatRequest>,
        ) -> Result<tonic::Response<super::HeartbeatResponse>, tonic::Status>;
        /// Server streaming response type for the StreamOperations method.
        type StreamOperationsStream: tonic::codegen::tokio_stream::Stream<
                Item = Result<super::Operation, tonic::Status>,
            > + Send
            + 'static;
        async fn stream_operations(
            &self,
            request: tonic::Request<super::StreamOperationsRequest>,
        ) -> Result<tonic::Response<Self::StreamOperationsStream>, tonic::Status>;
        async fn report_result(
            &self,
            request: tonic::Request<super::ReportResultRequest>,
        ) -> Result<tonic::Response<super::ReportResultResponse>, tonic::Status>;
        async fn cancel_operation(
            &self,
            request: tonic::Request<super::CancelOperationRequest>,
        ) -> Result<tonic::Response<super::CancelOperationResponse>, tonic::Status>;
        async fn stream_logs(
            &self,
            request: tonic::Request<tonic::Streaming<super::LogEntry>>,
        ) -> Result<tonic::Response<super::StreamLogsResponse>, tonic::Status>;
        async fn stream_metrics(
            &self,
            request: tonic::Request<tonic::Streaming<super::MetricSample>>,
        ) -> Result<tonic::Response<super::StreamMetricsResponse>, tonic::Status>;
    }

    pub struct AgentServiceServer<T: AgentService> {
        inner: Arc<T>,
    }

    impl<T: AgentService> AgentServiceServer<T> {
        pub fn new(inner: T) -> Self {
            Self::from_arc(Arc::new(inner))
        }

        pub fn from_arc(inner: Arc<T>) -> Self {
            Self { inner }
        }
    }

    impl<T: AgentService> Clone for AgentServiceServer<T> {
        fn clone(&self) -> Self {
            Self {
                inner: self.inner.clone(),
            }
        }
    }

    impl<T, B> Service<http::Request<B>> for AgentServiceServer<T>
    where
        T: AgentService,
        B: Body + Send + 'static,
        B::Error: Into<StdError> + Send + 'static,
    {
        type Response = http::Response<tonic::body::BoxBody>;
        type Error = std::convert::Infallible;
        type Future = BoxFuture<Self::Response, Self::Error>;

        fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, req: http::Request<B>) -> Self::Future {
            let inner = self.inner.clone();
            match req.uri().path() {
                "/fleet.agent.v1.AgentService/Register" => {
                    struct RegisterSvc<T: AgentService>(pub Arc<T>);
                    impl<T: AgentService> tonic::server::UnaryService<super::RegisterRequest> for RegisterSvc<T> {
                        type Response = super::RegisterResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::RegisterRequest>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            Box::pin(async move { inner.register(request).await })
                        }
                    }
                    Box::pin(async move {
                        let method = RegisterSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    })
                }
                "/fleet.agent.v1.AgentService/Heartbeat" => {
                    struct HeartbeatSvc<T: AgentService>(pub Arc<T>);
                    impl<T: AgentService> tonic::server::UnaryService<super::HeartbeatRequest> for HeartbeatSvc<T> {
                        type Response = super::HeartbeatResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::HeartbeatRequest>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            Box::pin(async move { inner.heartbeat(request).await })
                        }
                    }
                    Box::pin(async move {
                        let method = HeartbeatSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    })
                }
                "/fleet.agent.v1.AgentService/StreamOperations" => {
                    struct StreamOperationsSvc<T: AgentService>(pub Arc<T>);
                    impl<T: AgentService>
                        tonic::server::ServerStreamingService<super::StreamOperationsRequest>
                        for StreamOperationsSvc<T>
                    {
                        type Response = super::Operation;
                        type ResponseStream = T::StreamOperationsStream;
                        type Future =
                            BoxFuture<tonic::Response<Self::ResponseStream>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::StreamOperationsRequest>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            Box::pin(async move { inner.stream_operations(request).await })
                        }
                    }
                    Box::pin(async move {
                        let method = StreamOperationsSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        let res = grpc.server_streaming(method, req).await;
                        Ok(res)
                    })
                }
                "/fleet.agent.v1.AgentService/ReportResult" => {
                    struct ReportResultSvc<T: AgentService>(pub Arc<T>);
                    impl<T: AgentService> tonic::server::UnaryService<super::ReportResultRequest>
                        for ReportResultSvc<T>
                    {
                        type Response = super::ReportResultResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::ReportResultRequest>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            Box::pin(async move { inner.report_result(request).await })
                        }
                    }
                    Box::pin(async move {
                        let method = ReportResultSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    })
                }
                "/fleet.agent.v1.AgentService/CancelOperation" => {
                    struct CancelOperationSvc<T: AgentService>(pub Arc<T>);
                    impl<T: AgentService> tonic::server::UnaryService<super::CancelOperationRequest>
                        for CancelOperationSvc<T>
                    {
                        type Response = super::CancelOperationResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<super::CancelOperationRequest>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            Box::pin(async move { inner.cancel_operation(request).await })
                        }
                    }
                    Box::pin(async move {
                        let method = CancelOperationSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        let res = grpc.unary(method, req).await;
                        Ok(res)
                    })
                }
                "/fleet.agent.v1.AgentService/StreamLogs" => {
                    struct StreamLogsSvc<T: AgentService>(pub Arc<T>);
                    impl<T: AgentService> tonic::server::ClientStreamingService<super::LogEntry>
                        for StreamLogsSvc<T>
                    {
                        type Response = super::StreamLogsResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<tonic::Streaming<super::LogEntry>>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            Box::pin(async move { inner.stream_logs(request).await })
                        }
                    }
                    Box::pin(async move {
                        let method = StreamLogsSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        let res = grpc.client_streaming(method, req).await;
                        Ok(res)
                    })
                }
                "/fleet.agent.v1.AgentService/StreamMetrics" => {
                    struct StreamMetricsSvc<T: AgentService>(pub Arc<T>);
                    impl<T: AgentService> tonic::server::ClientStreamingService<super::MetricSample>
                        for StreamMetricsSvc<T>
                    {
                        type Response = super::StreamMetricsResponse;
                        type Future = BoxFuture<tonic::Response<Self::Response>, tonic::Status>;
                        fn call(
                            &mut self,
                            request: tonic::Request<tonic::Streaming<super::MetricSample>>,
                        ) -> Self::Future {
                            let inner = self.0.clone();
                            Box::pin(async move { inner.stream_metrics(request).await })
                        }
                    }
                    Box::pin(async move {
                        let method = StreamMetricsSvc(inner);
                        let codec = tonic::codec::ProstCodec::default();
                        let mut grpc = tonic::server::Grpc::new(codec);
                        let res = grpc.client_streaming(method, req).await;
                        Ok(res)
                    })
                }
                _ => Box::pin(async move {
                    Ok(http::Response::builder()
                        .status(200)
                        .header("grpc-status", "12")
                        .header("content-type", "application/grpc")
                        .body(tonic::body::empty_body())
                        .unwrap())
                }),
            }
        }
    }

    impl<T: AgentService> tonic::server::NamedService for AgentServiceServer<T> {
        const NAME: &'static str = "fleet.agent.v1.AgentService";
    }
}
