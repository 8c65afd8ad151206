use std::future::Future;

use async_trait::async_trait;

use crate::domain::DomainError;

#[async_trait]
pub trait Runnable<I>: Send + Sync
where
    I: Send + 'static,
{
    type Output: Send + 'static;

    async fn invoke(&self, input: I) -> Result<Self::Output, DomainError>;
}

#[derive(Debug, Clone)]
pub struct Pipe<A, B> {
    first: A,
    second: B,
}

impl<A, B> Pipe<A, B> {
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    pub fn first(&self) -> &A {
        &self.first
    }

    pub fn second(&self) -> &B {
        &self.second
    }
}

#[async_trait]
impl<I, A, B> Runnable<I> for Pipe<A, B>
where
    I: Send + 'static,
    A: Runnable<I>,
    B: Runnable<A::Output>,
{
    type Output = B::Output;

    async fn invoke(&self, input: I) -> Result<Self::Output, DomainError> {
        let intermediate = self.first.invoke(input).await?;
        self.second.invoke(intermediate).await
    }
}

pub trait RunnableExt<I>: Runnable<I> + Sized
where
    I: Send + 'static,
{
    fn pipe<B>(self, next: B) -> Pipe<Self, B>
    where
        B: Runnable<Self::Output>,
    {
        Pipe::new(self, next)
    }
}

impl<I, R> RunnableExt<I> for R
where
    I: Send + 'static,
    R: Runnable<I>,
{
}

/// An async closure used as a stage, e.g. to feed one chain's output into another's template.
pub struct Lambda<F> {
    func: F,
}

impl<F> Lambda<F> {
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<I, O, F, Fut> Runnable<I> for Lambda<F>
where
    I: Send + 'static,
    O: Send + 'static,
    F: Fn(I) -> Fut + Send + Sync,
    Fut: Future<Output = Result<O, DomainError>> + Send + 'static,
{
    type Output = O;

    async fn invoke(&self, input: I) -> Result<O, DomainError> {
        (self.func)(input).await
    }
}
