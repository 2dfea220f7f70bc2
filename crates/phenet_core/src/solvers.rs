use crate::traits::{DynamicalSystem, Scalar, Steppable};

/// Classic Runge-Kutta 4th order solver with preallocated stage buffers.
pub struct RK4<T: Scalar> {
    k1: Vec<T>,
    k2: Vec<T>,
    k3: Vec<T>,
    k4: Vec<T>,
    tmp: Vec<T>,
}

impl<T: Scalar> RK4<T> {
    pub fn new(dim: usize) -> Self {
        let z = T::from_f64(0.0).unwrap();
        Self {
            k1: vec![z; dim],
            k2: vec![z; dim],
            k3: vec![z; dim],
            k4: vec![z; dim],
            tmp: vec![z; dim],
        }
    }
}

impl<T: Scalar> Steppable<T> for RK4<T> {
    fn step(&mut self, system: &impl DynamicalSystem<T>, t: &mut T, state: &mut [T], dt: T) {
        let half = T::from_f64(0.5).unwrap();
        let sixth = T::from_f64(1.0 / 6.0).unwrap();
        let two = T::from_f64(2.0).unwrap();

        let t0 = *t;

        // k1 = F(t, x)
        system.apply(t0, state, &mut self.k1);

        // k2 = F(t + dt/2, x + dt*k1/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k1[i] * half;
        }
        system.apply(t0 + dt * half, &self.tmp, &mut self.k2);

        // k3 = F(t + dt/2, x + dt*k2/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k2[i] * half;
        }
        system.apply(t0 + dt * half, &self.tmp, &mut self.k3);

        // k4 = F(t + dt, x + dt*k3)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k3[i];
        }
        system.apply(t0 + dt, &self.tmp, &mut self.k4);

        // x_next = x + dt/6 * (k1 + 2k2 + 2k3 + k4)
        for i in 0..state.len() {
            state[i] = state[i]
                + dt * sixth * (self.k1[i] + two * self.k2[i] + two * self.k3[i] + self.k4[i]);
        }

        *t = t0 + dt;
    }
}
